use serde::ser::{Serialize, SerializeMap, Serializer};

/// Why a successful model run did not produce a reportable item.
#[derive(Debug, Clone, PartialEq)]
pub enum Unrecognized {
    /// The model found nothing above its confidence floor.
    NoDetection,
    /// The best detection is below the reporting threshold.
    LowConfidence {
        /// Confidence of the best detection, rounded to 2 decimals.
        confidence: f64,
    },
    /// The best detection's class has no display label.
    UnknownClass {
        /// The model's class name.
        class: String,
    },
}

impl Unrecognized {
    /// Machine readable reason, as emitted in the `reason` field.
    pub fn reason(&self) -> &'static str {
        match self {
            Unrecognized::NoDetection => "no_detection",
            Unrecognized::LowConfidence { .. } => "low_confidence",
            Unrecognized::UnknownClass { .. } => "unknown_class",
        }
    }
}

/// Result of classifying one image.
///
/// Serializes to one of:
///
/// ```json
/// {"object_type": "Plastic Bottle", "confidence": 0.87}
/// {"unrecognized": true, "reason": "low_confidence", "confidence": 0.31}
/// {"error": "Model not found"}
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A confident detection of a known plastic type.
    Recognized {
        /// Display label of the detected class.
        object_type: String,
        /// Confidence rounded to 2 decimals.
        confidence: f64,
    },
    /// The model ran but its result does not qualify.
    Unrecognized(Unrecognized),
    /// Classification could not be carried out.
    Error(String),
}

impl Outcome {
    /// Build an error outcome from anything printable.
    pub fn error(message: impl std::fmt::Display) -> Self {
        Outcome::Error(message.to_string())
    }
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Outcome::Recognized {
                object_type,
                confidence,
            } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("object_type", object_type)?;
                map.serialize_entry("confidence", confidence)?;
                map.end()
            }
            Outcome::Unrecognized(unrecognized) => {
                let len = match unrecognized {
                    Unrecognized::NoDetection => 2,
                    _ => 3,
                };
                let mut map = serializer.serialize_map(Some(len))?;
                map.serialize_entry("unrecognized", &true)?;
                map.serialize_entry("reason", unrecognized.reason())?;
                match unrecognized {
                    Unrecognized::NoDetection => {}
                    Unrecognized::LowConfidence { confidence } => {
                        map.serialize_entry("confidence", confidence)?
                    }
                    Unrecognized::UnknownClass { class } => map.serialize_entry("class", class)?,
                }
                map.end()
            }
            Outcome::Error(message) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("error", message)?;
                map.end()
            }
        }
    }
}

/// Single line JSON form of the outcome.
impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| std::fmt::Error)?;
        f.write_str(&json)
    }
}

/// Round a confidence score to 2 decimals, ties to even.
///
/// Widening to `f64` makes the scaled value exact, so a tie is only taken
/// when the `f32` score lies exactly halfway.
pub fn round_confidence(confidence: f32) -> f64 {
    (f64::from(confidence) * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_recognized_json() -> Result<(), serde_json::Error> {
        let outcome = Outcome::Recognized {
            object_type: "Plastic Bottle".to_string(),
            confidence: round_confidence(0.8731),
        };
        assert_eq!(
            outcome.to_string(),
            r#"{"object_type":"Plastic Bottle","confidence":0.87}"#
        );
        assert_eq!(
            serde_json::to_value(&outcome)?,
            json!({"object_type": "Plastic Bottle", "confidence": 0.87})
        );
        Ok(())
    }

    #[test]
    fn test_unrecognized_json() -> Result<(), serde_json::Error> {
        assert_eq!(
            Outcome::Unrecognized(Unrecognized::NoDetection).to_string(),
            r#"{"unrecognized":true,"reason":"no_detection"}"#
        );
        assert_eq!(
            serde_json::to_value(Outcome::Unrecognized(Unrecognized::LowConfidence {
                confidence: 0.31
            }))?,
            json!({"unrecognized": true, "reason": "low_confidence", "confidence": 0.31})
        );
        assert_eq!(
            Outcome::Unrecognized(Unrecognized::UnknownClass {
                class: "glass_jar".to_string()
            })
            .to_string(),
            r#"{"unrecognized":true,"reason":"unknown_class","class":"glass_jar"}"#
        );
        Ok(())
    }

    #[test]
    fn test_error_json() {
        assert_eq!(
            Outcome::error("Model not found").to_string(),
            r#"{"error":"Model not found"}"#
        );
    }

    #[test]
    fn test_round_confidence() {
        assert_eq!(round_confidence(0.874), 0.87);
        assert_eq!(round_confidence(0.876), 0.88);
        assert_eq!(round_confidence(0.4), 0.4);
        assert_eq!(round_confidence(1.0), 1.0);
        // exact halves round to the even neighbour
        assert_eq!(round_confidence(0.625), 0.62);
        assert_eq!(round_confidence(0.375), 0.38);
        assert_eq!(round_confidence(0.875), 0.88);
        assert_eq!(round_confidence(0.555), 0.56);
        for c in [0.0f32, 0.25, 0.3949, 0.399, 0.40, 0.555, 0.999] {
            let once = round_confidence(c);
            assert_eq!(round_confidence(once as f32), once);
        }
    }
}
