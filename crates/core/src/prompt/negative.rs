//! Negative prompt: a fixed base list plus per-template exclusions.

use crate::templates::ShotTemplate;

pub const BASE_NEGATIVE: &[&str] = &[
    "blurry",
    "low quality",
    "distorted",
    "deformed",
    "bad anatomy",
    "wrong proportions",
    "extra limbs",
    "cropped",
    "watermark",
    "signature",
    "text",
];

fn template_exclusions(template: ShotTemplate) -> &'static [&'static str] {
    match template {
        ShotTemplate::T6Closeup => &["too far", "full body", "wide shot"],
        ShotTemplate::T1EstablishingWide => &["too close", "face focus", "portrait"],
        ShotTemplate::T9Pov => &["face of viewer visible", "self visible"],
        _ => &[],
    }
}

pub fn negative_prompt(template: ShotTemplate) -> String {
    BASE_NEGATIVE
        .iter()
        .chain(template_exclusions(template))
        .copied()
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_template_uses_base_list_only() {
        assert_eq!(
            negative_prompt(ShotTemplate::T4StandardMedium),
            "blurry, low quality, distorted, deformed, bad anatomy, wrong proportions, \
             extra limbs, cropped, watermark, signature, text"
        );
    }

    #[test]
    fn closeup_excludes_wide_framing() {
        assert!(negative_prompt(ShotTemplate::T6Closeup).ends_with("text, too far, full body, wide shot"));
    }

    #[test]
    fn establishing_and_pov_exclusions() {
        assert!(negative_prompt(ShotTemplate::T1EstablishingWide).ends_with("too close, face focus, portrait"));
        assert!(negative_prompt(ShotTemplate::T9Pov).ends_with("face of viewer visible, self visible"));
    }
}
