use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern.
///
/// Variants are declared in ascending order, so the derived `Ord` follows
/// declaration order (relied upon by `RiskLevel`).
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(InputMode {
    Text => "text",
    Image => "image",
    Mixed => "mixed",
});

impl InputMode {
    /// Combine the current mode with the mode of a new input.
    /// TEXT and IMAGE upgrade to MIXED; MIXED never downgrades.
    pub fn merge(self, incoming: InputMode) -> InputMode {
        if self == incoming {
            self
        } else {
            InputMode::Mixed
        }
    }
}

str_enum!(SessionStatus {
    Active => "active",
    Finalized => "finalized",
});

str_enum!(Category {
    Fever => "FEVER",
    Headache => "HEADACHE",
    Gi => "GI",
    Wound => "WOUND",
    Skin => "SKIN",
    General => "GENERAL",
});

str_enum!(RiskLevel {
    None => "none",
    Low => "low",
    Medium => "medium",
    High => "high",
    Critical => "critical",
});

impl RiskLevel {
    pub const ALL: [RiskLevel; 5] = [
        RiskLevel::None,
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    /// High or critical: the levels that trigger escalation guidance.
    pub fn is_elevated(self) -> bool {
        self >= RiskLevel::High
    }
}

str_enum!(Severity {
    Low => "low",
    Medium => "medium",
    High => "high",
});

str_enum!(MessageRole {
    User => "user",
    Assistant => "assistant",
});
