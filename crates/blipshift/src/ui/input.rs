//! Validation of typed operator input.

use crate::domain::errors::DomainError;
use crate::domain::model::Vec3;

const NOT_A_NUMBER: &str = "All values must be valid numbers.";

/// `7554.967, -285.6804, 6.080537`
pub fn parse_reference_point(input: &str) -> Result<Vec3, DomainError> {
    let parts: Vec<&str> = input.split(',').collect();
    if parts.len() != 3 {
        return Err(DomainError::Validation(
            "Please enter exactly three values separated by commas.".into(),
        ));
    }
    parse_triple(&parts)
}

/// `12.5 -3 0`
pub fn parse_offset_vector(input: &str) -> Result<Vec3, DomainError> {
    let parts: Vec<&str> = input.split_whitespace().collect();
    if parts.len() != 3 {
        return Err(DomainError::Validation(
            "Please enter exactly three values separated by spaces.".into(),
        ));
    }
    parse_triple(&parts)
}

/// Answer to the offset prompt. Cancelling (`None`) declines even when a default exists; a blank
/// line falls back to `default`.
pub fn resolve_offset_answer(
    answer: Option<&str>,
    default: Option<Vec3>,
) -> Result<Option<Vec3>, DomainError> {
    match answer {
        None => Ok(None),
        Some(line) if line.trim().is_empty() => Ok(default),
        Some(line) => parse_offset_vector(line).map(Some),
    }
}

fn parse_triple(parts: &[&str]) -> Result<Vec3, DomainError> {
    let mut values = [0.0; 3];
    for (value, part) in values.iter_mut().zip(parts) {
        *value = part
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|parsed| parsed.is_finite())
            .ok_or_else(|| DomainError::Validation(NOT_A_NUMBER.into()))?;
    }
    Ok(Vec3::from(values))
}

/// Parse a list of 1-based choices such as `1 3`, `2,4`, `1-3` or `all` into 0-based indices.
///
/// Order of first mention is kept and repeats are dropped. Blank input yields an empty list.
pub fn parse_selection(input: &str, len: usize) -> Result<Vec<usize>, DomainError> {
    let trimmed = input.trim();
    if trimmed.eq_ignore_ascii_case("all") || trimmed == "*" {
        return Ok((0..len).collect());
    }

    let mut selected = Vec::new();
    for token in trimmed
        .split(|ch: char| ch == ',' || ch.is_whitespace())
        .filter(|token| !token.is_empty())
    {
        let (start, end) = match token.split_once('-') {
            Some((start, end)) => (parse_choice(start, len)?, parse_choice(end, len)?),
            None => {
                let choice = parse_choice(token, len)?;
                (choice, choice)
            }
        };
        for index in start.min(end)..=start.max(end) {
            if !selected.contains(&index) {
                selected.push(index);
            }
        }
    }
    Ok(selected)
}

/// Parse one 1-based choice into a 0-based index.
pub fn parse_choice(input: &str, len: usize) -> Result<usize, DomainError> {
    let trimmed = input.trim();
    match trimmed.parse::<usize>() {
        Ok(choice) if (1..=len).contains(&choice) => Ok(choice - 1),
        _ => Err(DomainError::Validation(format!(
            "'{trimmed}' is not a choice between 1 and {len}."
        ))),
    }
}
