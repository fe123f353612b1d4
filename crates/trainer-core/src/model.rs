//! Domain types shared by the sampler, the resolver and the session.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use shakmaty::{uci::UciMove, Color, Square};

/// Time-control categories understood by the opening explorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Speed {
    UltraBullet,
    Bullet,
    Blitz,
    Rapid,
    Classical,
    Correspondence,
}

impl Speed {
    pub const ALL: [Speed; 6] = [
        Speed::UltraBullet,
        Speed::Bullet,
        Speed::Blitz,
        Speed::Rapid,
        Speed::Classical,
        Speed::Correspondence,
    ];

    /// Name used in explorer query strings.
    pub fn api_name(self) -> &'static str {
        match self {
            Speed::UltraBullet => "ultraBullet",
            Speed::Bullet => "bullet",
            Speed::Blitz => "blitz",
            Speed::Rapid => "rapid",
            Speed::Classical => "classical",
            Speed::Correspondence => "correspondence",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Speed::UltraBullet => "Ultrabullet",
            Speed::Bullet => "Bullet",
            Speed::Blitz => "Blitz",
            Speed::Rapid => "Rapid",
            Speed::Classical => "Classical",
            Speed::Correspondence => "Correspondence",
        }
    }
}

/// Rating buckets understood by the opening explorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum RatingBand {
    R1600,
    R1800,
    R2000,
    R2200,
    R2500,
}

impl RatingBand {
    pub const ALL: [RatingBand; 5] = [
        RatingBand::R1600,
        RatingBand::R1800,
        RatingBand::R2000,
        RatingBand::R2200,
        RatingBand::R2500,
    ];

    pub fn rating(self) -> u16 {
        match self {
            RatingBand::R1600 => 1600,
            RatingBand::R1800 => 1800,
            RatingBand::R2000 => 2000,
            RatingBand::R2200 => 2200,
            RatingBand::R2500 => 2500,
        }
    }
}

impl TryFrom<u16> for RatingBand {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        RatingBand::ALL
            .into_iter()
            .find(|band| band.rating() == value)
            .ok_or_else(|| format!("unsupported rating band: {value}"))
    }
}

impl From<RatingBand> for u16 {
    fn from(band: RatingBand) -> u16 {
        band.rating()
    }
}

/// Which games count toward the statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filters {
    pub speeds: BTreeSet<Speed>,
    pub ratings: BTreeSet<RatingBand>,
}

impl Filters {
    pub fn new(
        speeds: impl IntoIterator<Item = Speed>,
        ratings: impl IntoIterator<Item = RatingBand>,
    ) -> Self {
        Self {
            speeds: speeds.into_iter().collect(),
            ratings: ratings.into_iter().collect(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.speeds.is_empty() && !self.ratings.is_empty()
    }

    /// Comma-separated speeds, e.g. `blitz,rapid`.
    pub fn speeds_param(&self) -> String {
        self.speeds
            .iter()
            .map(|s| s.api_name())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Comma-separated ratings, e.g. `1600,1800`.
    pub fn ratings_param(&self) -> String {
        self.ratings
            .iter()
            .map(|r| r.rating().to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Default for Filters {
    fn default() -> Self {
        Self::new(Speed::ALL, RatingBand::ALL)
    }
}

pub const DEFAULT_GAMES_THRESHOLD: u64 = 100;

/// Frozen at `Session::start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(with = "color_serde")]
    pub user_color: Color,
    #[serde(with = "color_serde")]
    pub starting_color: Color,
    pub filters: Filters,
    /// A sampled move played in fewer games than this ends the session.
    pub total_games_threshold: u64,
}

impl SessionConfig {
    pub fn opponent_color(&self) -> Color {
        !self.user_color
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_color: Color::White,
            starting_color: Color::White,
            filters: Filters::default(),
            total_games_threshold: DEFAULT_GAMES_THRESHOLD,
        }
    }
}

/// One explorer row: a move and its results in the filtered games.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsRow {
    pub san: String,
    pub white: u64,
    pub draws: u64,
    pub black: u64,
}

/// A move and how many filtered games it was played in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningStatEntry {
    pub san: String,
    pub games: u64,
}

impl OpeningStatEntry {
    pub fn new(san: impl Into<String>, games: u64) -> Self {
        Self {
            san: san.into(),
            games,
        }
    }
}

impl From<StatsRow> for OpeningStatEntry {
    fn from(row: StatsRow) -> Self {
        Self {
            games: row
                .white
                .saturating_add(row.draws)
                .saturating_add(row.black),
            san: row.san,
        }
    }
}

/// Cloud evaluation score, from White's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Evaluation {
    Centipawns(i32),
    /// Forced mate in N; negative when Black mates.
    Mate(i32),
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evaluation::Centipawns(cp) => write!(f, "{:.2}", f64::from(*cp) / 100.0),
            Evaluation::Mate(n) => write!(f, "#{n}"),
        }
    }
}

/// A move as played in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayedMove {
    #[serde(with = "square_serde")]
    pub from: Square,
    #[serde(with = "square_serde")]
    pub to: Square,
    pub san: String,
    #[serde(with = "uci_serde")]
    pub uci: UciMove,
}

pub mod color_serde {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use shakmaty::Color;

    pub fn serialize<S: Serializer>(c: &Color, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(match c {
            Color::White => "white",
            Color::Black => "black",
        })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Color, D::Error> {
        let name = String::deserialize(d)?;
        match name.as_str() {
            "white" | "w" => Ok(Color::White),
            "black" | "b" => Ok(Color::Black),
            other => Err(Error::custom(format!("expected white or black, got {other}"))),
        }
    }
}

pub mod square_serde {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use shakmaty::Square;

    pub fn serialize<S: Serializer>(sq: &Square, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&sq.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Square, D::Error> {
        let name = String::deserialize(d)?;
        name.parse()
            .map_err(|_| Error::custom(format!("error in parsing square: {name}")))
    }
}

pub mod uci_serde {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use shakmaty::uci::UciMove;

    pub fn serialize<S: Serializer>(u: &UciMove, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&u.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<UciMove, D::Error> {
        let text = String::deserialize(d)?;
        text.parse()
            .map_err(|_| Error::custom("error in parsing move's UCI"))
    }
}
