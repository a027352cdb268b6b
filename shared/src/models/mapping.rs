//! SKU to recipe mappings

use serde::Serialize;

use crate::types::percent_of;

text_enum! {
    /// How far an automatic SKU match can be trusted
    pub enum Confidence {
        AutoHigh => "auto-high",
        AutoLow => "auto-low",
        Low => "low",
        Manual => "manual",
    }
}

impl Confidence {
    pub fn is_high(&self) -> bool {
        matches!(self, Confidence::AutoHigh | Confidence::Manual)
    }

    pub fn is_low(&self) -> bool {
        matches!(self, Confidence::AutoLow | Confidence::Low)
    }
}

/// The facts about a mapping that feed its statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingFacts {
    pub confidence: Option<Confidence>,
    pub needs_review: bool,
    pub has_recipe: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MappingStats {
    pub total: usize,
    pub needs_review: usize,
    pub high_confidence: usize,
    pub low_confidence: usize,
    pub unmapped: usize,
    pub percent_complete: i64,
}

impl MappingStats {
    pub fn tally<I: IntoIterator<Item = MappingFacts>>(facts: I) -> Self {
        let mut stats = facts.into_iter().fold(Self::default(), |mut s, f| {
            s.total += 1;
            if f.needs_review {
                s.needs_review += 1;
            }
            match f.confidence {
                Some(c) if c.is_high() => s.high_confidence += 1,
                Some(c) if c.is_low() => s.low_confidence += 1,
                _ => {}
            }
            if !f.has_recipe {
                s.unmapped += 1;
            }
            s
        });
        stats.percent_complete = percent_of(stats.high_confidence, stats.total);
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(confidence: Option<Confidence>, needs_review: bool, has_recipe: bool) -> MappingFacts {
        MappingFacts {
            confidence,
            needs_review,
            has_recipe,
        }
    }

    #[test]
    fn test_confidence_text() {
        assert_eq!("auto-high".parse::<Confidence>(), Ok(Confidence::AutoHigh));
        assert_eq!(Confidence::AutoLow.as_str(), "auto-low");
    }

    #[test]
    fn test_stats() {
        let stats = MappingStats::tally(vec![
            facts(Some(Confidence::Manual), false, true),
            facts(Some(Confidence::AutoHigh), false, true),
            facts(Some(Confidence::Low), true, true),
            facts(None, true, false),
        ]);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.needs_review, 2);
        assert_eq!(stats.high_confidence, 2);
        assert_eq!(stats.low_confidence, 1);
        assert_eq!(stats.unmapped, 1);
        assert_eq!(stats.percent_complete, 50);
    }

    #[test]
    fn test_empty_stats() {
        assert_eq!(MappingStats::tally(Vec::new()).percent_complete, 0);
    }
}
