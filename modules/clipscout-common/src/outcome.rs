/// Result of a single signal extraction.
///
/// Extractors never abort the per-video pipeline: any internal failure
/// (missing media, OCR miss, tool error) is folded into `Degraded` with the
/// documented default value and a reason. Callers decide whether the reason
/// is worth logging.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction<T> {
    Ok(T),
    Degraded { value: T, reason: String },
}

impl<T> Extraction<T> {
    pub fn degraded(value: T, reason: impl Into<String>) -> Self {
        Extraction::Degraded {
            value,
            reason: reason.into(),
        }
    }

    /// The extracted (or default) value, discarding the degradation reason.
    pub fn into_value(self) -> T {
        match self {
            Extraction::Ok(v) => v,
            Extraction::Degraded { value, .. } => value,
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Extraction::Ok(v) => v,
            Extraction::Degraded { value, .. } => value,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Extraction::Ok(_) => None,
            Extraction::Degraded { reason, .. } => Some(reason),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Extraction::Degraded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degraded_carries_default_and_reason() {
        let e = Extraction::degraded(String::new(), "no media");
        assert!(e.is_degraded());
        assert_eq!(e.reason(), Some("no media"));
        assert_eq!(e.into_value(), "");
    }

    #[test]
    fn ok_has_no_reason() {
        let e = Extraction::Ok(42);
        assert_eq!(e.reason(), None);
        assert_eq!(e.into_value(), 42);
    }
}
