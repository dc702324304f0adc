use serde::{Deserialize, Serialize};

use crate::types::Timeframe;

/// Family a pattern belongs to. Win rates are configured per family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternFamily {
    Triangle,
    FlagPennant,
    HeadAndShoulders,
    DoubleTopBottom,
    TripleTopBottom,
    CupAndHandle,
    Wedge,
    Rounding,
    Rectangle,
    Diamond,
    Gap,
    Candlestick,
    Harmonic,
}

/// Expected direction of the move a pattern implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternBias {
    Bullish,
    Bearish,
    Neutral,
}

/// Every pattern the detector knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    // Triangles
    AscendingTriangle,
    DescendingTriangle,
    SymmetricalTriangle,
    // Flags and pennants
    BullFlag,
    BearFlag,
    BullPennant,
    BearPennant,
    // Head and shoulders
    HeadAndShoulders,
    InverseHeadAndShoulders,
    // Double / triple
    DoubleTop,
    DoubleBottom,
    TripleTop,
    TripleBottom,
    // Cups
    CupAndHandle,
    InverseCupAndHandle,
    // Wedges
    RisingWedge,
    FallingWedge,
    // Rounding
    RoundingTop,
    RoundingBottom,
    // Rectangles
    BullishRectangle,
    BearishRectangle,
    // Diamonds
    DiamondTop,
    DiamondBottom,
    // Gaps
    BreakawayGap,
    RunawayGap,
    ExhaustionGap,
    CommonGap,
    // Candlesticks
    Hammer,
    InvertedHammer,
    ShootingStar,
    HangingMan,
    BullishEngulfing,
    BearishEngulfing,
    PiercingLine,
    DarkCloudCover,
    BullishHarami,
    BearishHarami,
    MorningStar,
    EveningStar,
    ThreeWhiteSoldiers,
    ThreeBlackCrows,
    Doji,
    DragonflyDoji,
    GravestoneDoji,
    SpinningTop,
    // Harmonics
    Gartley,
    Butterfly,
    Bat,
    Crab,
    Cypher,
    Shark,
    Abcd,
}

impl PatternType {
    pub fn family(&self) -> PatternFamily {
        use PatternType::*;
        match self {
            AscendingTriangle | DescendingTriangle | SymmetricalTriangle => PatternFamily::Triangle,
            BullFlag | BearFlag | BullPennant | BearPennant => PatternFamily::FlagPennant,
            HeadAndShoulders | InverseHeadAndShoulders => PatternFamily::HeadAndShoulders,
            DoubleTop | DoubleBottom => PatternFamily::DoubleTopBottom,
            TripleTop | TripleBottom => PatternFamily::TripleTopBottom,
            CupAndHandle | InverseCupAndHandle => PatternFamily::CupAndHandle,
            RisingWedge | FallingWedge => PatternFamily::Wedge,
            RoundingTop | RoundingBottom => PatternFamily::Rounding,
            BullishRectangle | BearishRectangle => PatternFamily::Rectangle,
            DiamondTop | DiamondBottom => PatternFamily::Diamond,
            BreakawayGap | RunawayGap | ExhaustionGap | CommonGap => PatternFamily::Gap,
            Gartley | Butterfly | Bat | Crab | Cypher | Shark | Abcd => PatternFamily::Harmonic,
            Hammer | InvertedHammer | ShootingStar | HangingMan | BullishEngulfing
            | BearishEngulfing | PiercingLine | DarkCloudCover | BullishHarami | BearishHarami
            | MorningStar | EveningStar | ThreeWhiteSoldiers | ThreeBlackCrows | Doji
            | DragonflyDoji | GravestoneDoji | SpinningTop => PatternFamily::Candlestick,
        }
    }

    /// Default directional bias. Gaps, symmetrical triangles and harmonics
    /// take their direction from the detection itself.
    pub fn bias(&self) -> PatternBias {
        use PatternType::*;
        match self {
            AscendingTriangle | BullFlag | BullPennant | InverseHeadAndShoulders
            | DoubleBottom | TripleBottom | CupAndHandle | FallingWedge | RoundingBottom
            | BullishRectangle | DiamondBottom | Hammer | InvertedHammer | BullishEngulfing
            | PiercingLine | BullishHarami | MorningStar | ThreeWhiteSoldiers
            | DragonflyDoji => PatternBias::Bullish,
            DescendingTriangle | BearFlag | BearPennant | HeadAndShoulders | DoubleTop
            | TripleTop | InverseCupAndHandle | RisingWedge | RoundingTop | BearishRectangle
            | DiamondTop | ShootingStar | HangingMan | BearishEngulfing | DarkCloudCover
            | BearishHarami | EveningStar | ThreeBlackCrows | GravestoneDoji => {
                PatternBias::Bearish
            }
            SymmetricalTriangle | BreakawayGap | RunawayGap | ExhaustionGap | CommonGap | Doji
            | SpinningTop | Gartley | Butterfly | Bat | Crab | Cypher | Shark | Abcd => {
                PatternBias::Neutral
            }
        }
    }

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        use PatternType::*;
        match self {
            AscendingTriangle => "Ascending Triangle",
            DescendingTriangle => "Descending Triangle",
            SymmetricalTriangle => "Symmetrical Triangle",
            BullFlag => "Bull Flag",
            BearFlag => "Bear Flag",
            BullPennant => "Bull Pennant",
            BearPennant => "Bear Pennant",
            HeadAndShoulders => "Head and Shoulders",
            InverseHeadAndShoulders => "Inverse Head and Shoulders",
            DoubleTop => "Double Top",
            DoubleBottom => "Double Bottom",
            TripleTop => "Triple Top",
            TripleBottom => "Triple Bottom",
            CupAndHandle => "Cup and Handle",
            InverseCupAndHandle => "Inverse Cup and Handle",
            RisingWedge => "Rising Wedge",
            FallingWedge => "Falling Wedge",
            RoundingTop => "Rounding Top",
            RoundingBottom => "Rounding Bottom",
            BullishRectangle => "Bullish Rectangle",
            BearishRectangle => "Bearish Rectangle",
            DiamondTop => "Diamond Top",
            DiamondBottom => "Diamond Bottom",
            BreakawayGap => "Breakaway Gap",
            RunawayGap => "Runaway Gap",
            ExhaustionGap => "Exhaustion Gap",
            CommonGap => "Common Gap",
            Hammer => "Hammer",
            InvertedHammer => "Inverted Hammer",
            ShootingStar => "Shooting Star",
            HangingMan => "Hanging Man",
            BullishEngulfing => "Bullish Engulfing",
            BearishEngulfing => "Bearish Engulfing",
            PiercingLine => "Piercing Line",
            DarkCloudCover => "Dark Cloud Cover",
            BullishHarami => "Bullish Harami",
            BearishHarami => "Bearish Harami",
            MorningStar => "Morning Star",
            EveningStar => "Evening Star",
            ThreeWhiteSoldiers => "Three White Soldiers",
            ThreeBlackCrows => "Three Black Crows",
            Doji => "Doji",
            DragonflyDoji => "Dragonfly Doji",
            GravestoneDoji => "Gravestone Doji",
            SpinningTop => "Spinning Top",
            Gartley => "Gartley",
            Butterfly => "Butterfly",
            Bat => "Bat",
            Crab => "Crab",
            Cypher => "Cypher",
            Shark => "Shark",
            Abcd => "AB=CD",
        }
    }
}

/// Qualitative strength bucket derived from confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternStrength {
    Weak,
    Moderate,
    Strong,
    VeryStrong,
}

impl PatternStrength {
    pub fn from_confidence(confidence: f64) -> Self {
        match confidence {
            c if c >= 85.0 => PatternStrength::VeryStrong,
            c if c >= 75.0 => PatternStrength::Strong,
            c if c >= 65.0 => PatternStrength::Moderate,
            _ => PatternStrength::Weak,
        }
    }
}

/// Anchor point of a pattern: bar index and price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyPoint {
    pub index: usize,
    pub price: f64,
}

impl KeyPoint {
    pub fn new(index: usize, price: f64) -> Self {
        Self { index, price }
    }
}

/// A detected chart or candlestick formation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub pattern_type: PatternType,
    pub bias: PatternBias,
    pub strength: PatternStrength,
    /// 0-100.
    pub confidence: f64,
    pub start_idx: usize,
    pub end_idx: usize,
    pub key_points: Vec<KeyPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_move_pct: Option<f64>,
    /// Historical win rate in percent, taken from the configured table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub win_probability: Option<f64>,
    pub timeframe: Timeframe,
    pub description: String,
}

impl Pattern {
    /// New pattern with the type's default bias and a strength bucket
    /// derived from `confidence`.
    pub fn new(
        pattern_type: PatternType,
        confidence: f64,
        start_idx: usize,
        end_idx: usize,
        timeframe: Timeframe,
        description: impl Into<String>,
    ) -> Self {
        let confidence = confidence.clamp(0.0, 100.0);
        Self {
            pattern_type,
            bias: pattern_type.bias(),
            strength: PatternStrength::from_confidence(confidence),
            confidence,
            start_idx,
            end_idx,
            key_points: Vec::new(),
            target_price: None,
            stop_loss: None,
            expected_move_pct: None,
            win_probability: None,
            timeframe,
            description: description.into(),
        }
    }

    pub fn with_key_points(mut self, key_points: Vec<KeyPoint>) -> Self {
        self.key_points = key_points;
        self
    }

    pub fn with_target(mut self, target_price: f64) -> Self {
        self.target_price = Some(target_price);
        self
    }

    pub fn with_stop(mut self, stop_loss: f64) -> Self {
        self.stop_loss = Some(stop_loss);
        self
    }

    /// Override the default bias for patterns whose direction depends on context.
    pub fn with_bias(mut self, bias: PatternBias) -> Self {
        self.bias = bias;
        self
    }

    pub fn family(&self) -> PatternFamily {
        self.pattern_type.family()
    }
}
