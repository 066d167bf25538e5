//! Deterministic assembly of the final prompt text.
//!
//! The base prompt comes first, followed by the text of every selected slot
//! variant ordered by `(slot position, variant name, variant id)`. Sections
//! are trimmed, empty sections are dropped, and the rest are joined with a
//! blank line.

use crate::types::DbId;

/// Separator placed between prompt sections.
pub const SECTION_SEPARATOR: &str = "\n\n";

/// The parts of a slot variant that take part in composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotVariantPart {
    pub id: DbId,
    pub name: String,
    pub prompt: Option<String>,
    /// Position of the variant's slot type; `None` when the slot type is missing.
    pub slot_position: Option<i32>,
}

/// Compose the final prompt from a base text and a set of slot variants.
///
/// The input order of `variants` does not affect the output.
pub fn compose_prompt(base: Option<&str>, variants: &[SlotVariantPart]) -> String {
    let mut ordered: Vec<&SlotVariantPart> = variants.iter().collect();
    ordered.sort_by(|a, b| {
        a.slot_position
            .unwrap_or(0)
            .cmp(&b.slot_position.unwrap_or(0))
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut sections: Vec<&str> = Vec::with_capacity(ordered.len() + 1);
    if let Some(base) = base.map(str::trim).filter(|s| !s.is_empty()) {
        sections.push(base);
    }
    sections.extend(
        ordered
            .iter()
            .filter_map(|v| v.prompt.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty()),
    );

    sections.join(SECTION_SEPARATOR)
}

/// Compose the prompt and fall back to `title` when the result is empty.
pub fn compose_with_title_fallback(
    title: &str,
    base: Option<&str>,
    variants: &[SlotVariantPart],
) -> String {
    let composed = compose_prompt(base, variants);
    if composed.is_empty() {
        title.trim().to_string()
    } else {
        composed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(id: DbId, name: &str, prompt: Option<&str>, pos: Option<i32>) -> SlotVariantPart {
        SlotVariantPart {
            id,
            name: name.to_string(),
            prompt: prompt.map(str::to_string),
            slot_position: pos,
        }
    }

    #[test]
    fn base_only() {
        assert_eq!(compose_prompt(Some("  snow  "), &[]), "snow");
    }

    #[test]
    fn orders_by_position_then_name_then_id() {
        let variants = vec![
            part(3, "b", Some("third"), Some(2)),
            part(1, "z", Some("first"), Some(1)),
            part(5, "a", Some("second-b"), Some(2)),
            part(4, "a", Some("second-a"), Some(2)),
        ];
        assert_eq!(
            compose_prompt(Some("base"), &variants),
            "base\n\nfirst\n\nsecond-a\n\nsecond-b\n\nthird"
        );
    }

    #[test]
    fn missing_slot_type_sorts_as_zero() {
        let variants = vec![
            part(1, "x", Some("positioned"), Some(1)),
            part(2, "y", Some("orphan"), None),
        ];
        assert_eq!(compose_prompt(None, &variants), "orphan\n\npositioned");
    }

    #[test]
    fn drops_empty_sections() {
        let variants = vec![
            part(1, "a", Some("   "), Some(1)),
            part(2, "b", None, Some(2)),
            part(3, "c", Some(" kept "), Some(3)),
        ];
        assert_eq!(compose_prompt(Some(""), &variants), "kept");
    }

    #[test]
    fn input_order_does_not_matter() {
        let a = part(1, "a", Some("one"), Some(1));
        let b = part(2, "b", Some("two"), Some(1));
        let c = part(3, "c", Some("three"), Some(0));
        let forward = compose_prompt(Some("base"), &[a.clone(), b.clone(), c.clone()]);
        let reversed = compose_prompt(Some("base"), &[c, b, a]);
        assert_eq!(forward, reversed);
    }

    #[test]
    fn title_fallback() {
        assert_eq!(
            compose_with_title_fallback("Snowy Scene", None, &[]),
            "Snowy Scene"
        );
        assert_eq!(
            compose_with_title_fallback("Snowy Scene", Some("snow"), &[]),
            "snow"
        );
        assert_eq!(compose_with_title_fallback("  ", None, &[]), "");
    }
}
