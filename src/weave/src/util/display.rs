use std::fmt::{Display, Formatter, Result as FmtResult};

/// Displays errors one per line, numbered from 1.
pub(crate) struct AggregatedDisplayer<'a, T> {
    errors: &'a [T],
}

impl<'a, T> AggregatedDisplayer<'a, T> {
    pub(crate) fn new(errors: &'a [T]) -> Self {
        Self { errors }
    }
}

impl<T: Display> Display for AggregatedDisplayer<'_, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for (i, error) in self.errors.iter().enumerate() {
            writeln!(f, "{:4}: {}", i + 1, error)?;
        }
        Ok(())
    }
}

/// Displays items joined by a separator.
pub(crate) struct ListDisplayer<'a, T> {
    items: &'a [T],
    separator: &'static str,
}

impl<'a, T> ListDisplayer<'a, T> {
    pub(crate) fn new(items: &'a [T], separator: &'static str) -> Self {
        Self { items, separator }
    }
}

impl<T: Display> Display for ListDisplayer<'_, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if let Some((first, rest)) = self.items.split_first() {
            write!(f, "{first}")?;
            for item in rest {
                write!(f, "{}{item}", self.separator)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregated_displayer_numbers_lines() {
        let errors = ["first", "second"];
        let output = AggregatedDisplayer::new(&errors).to_string();
        assert_eq!(output, "   1: first\n   2: second\n");
    }

    #[test]
    fn list_displayer_joins_items() {
        assert_eq!(ListDisplayer::new(&["A", "B", "A"], " -> ").to_string(), "A -> B -> A");
        assert_eq!(ListDisplayer::<&str>::new(&[], ", ").to_string(), "");
    }
}
