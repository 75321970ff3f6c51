//! Per-file dialect auto-detection.

use tracing::debug;
use varimap_core::DialectKind;

use crate::adapters::confidence;

/// The dialect chosen for one file and how it was chosen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub dialect: DialectKind,
    /// Score of the chosen dialect; for a fallback, the best score that
    /// failed to clear the threshold.
    pub confidence: f64,
    /// No dialect cleared the threshold and the plain adapter runs.
    pub fallback: bool,
}

impl Detection {
    /// A configured override: detection is skipped.
    #[must_use]
    pub const fn forced(dialect: DialectKind) -> Self {
        Self {
            dialect,
            confidence: 1.0,
            fallback: false,
        }
    }
}

/// Pick the dialect whose confidence exceeds `threshold`, preferring
/// interface/implementation, then toybox, then kbuild on ties.
#[must_use]
pub fn detect(content: &str, threshold: f64) -> Detection {
    let mut best: Option<(DialectKind, f64)> = None;
    for dialect in DialectKind::ALL {
        if dialect == DialectKind::Plain {
            continue;
        }
        let score = confidence(dialect, content);
        debug!(%dialect, score, "dialect confidence");
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((dialect, score));
        }
    }

    match best {
        Some((dialect, score)) if score > threshold => Detection {
            dialect,
            confidence: score,
            fallback: false,
        },
        _ => Detection {
            dialect: DialectKind::Plain,
            confidence: best.map_or(0.0, |(_, score)| score),
            fallback: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ifdef_only_source_falls_back_to_plain() {
        let main = "#ifdef CONFIG_USE_GETS\nx();\n#endif\n#ifdef TEST\n#endif\n#if ENABLE_TEST\n#endif\n";
        let detection = detect(main, 0.5);
        assert_eq!(detection.dialect, DialectKind::Plain);
        assert!(detection.fallback);
        assert!(detection.confidence > 0.0);
    }

    #[test]
    fn kconfig_comment_selects_kbuild() {
        let src = "//config:config A\n//config:  bool \"a\"\n#ifdef CONFIG_A\n#endif\n";
        let detection = detect(src, 0.5);
        assert_eq!(detection.dialect, DialectKind::Kbuild);
        assert!(!detection.fallback);
    }

    #[test]
    fn threshold_of_one_always_falls_back() {
        let src = "INTERFACE:\nIMPLEMENTATION[x]:\n";
        assert_eq!(detect(src, 0.5).dialect, DialectKind::InterfaceImpl);
        assert_eq!(detect(src, 1.0).dialect, DialectKind::Plain);
    }

    #[test]
    fn forced_detection_reports_full_confidence() {
        let detection = Detection::forced(DialectKind::Toybox);
        assert!((detection.confidence - 1.0).abs() < f64::EPSILON);
        assert!(!detection.fallback);
    }
}
