//! Instruction text sent to the image providers.

use crate::models::generation::Gender;

/// Wrap a hairstyle request so the provider leaves the person's identity alone.
pub fn edit_instruction(prompt: &str) -> String {
    format!(
        "Edit this photo: {}. Change only the hair. Keep the face, facial features, \
         skin tone, expression, clothing, background, lighting and framing exactly \
         as in the original photo. The result must look like a natural photograph \
         of the same person.",
        prompt.trim().trim_end_matches('.')
    )
}

/// Prompt for a standalone hair overlay rendered on a plain background.
pub fn hair_png_prompt(style_prompt: &str, gender: Gender) -> String {
    let subject = match gender {
        Gender::Male => "men's",
        Gender::Female => "women's",
        Gender::Neutral => "unisex",
    };
    format!(
        "A {subject} hairstyle: {}. Hair only, no face, no head, no body, front view, \
         centered, isolated on a plain pure white background, studio lighting, \
         high detail, photorealistic strands.",
        style_prompt.trim().trim_end_matches('.')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_instruction_keeps_user_prompt() {
        let text = edit_instruction("  wavy shoulder-length bob. ");
        assert!(text.starts_with("Edit this photo: wavy shoulder-length bob. Change only the hair."));
    }

    #[test]
    fn test_hair_prompt_mentions_gender() {
        assert!(hair_png_prompt("fade", Gender::Male).starts_with("A men's hairstyle: fade."));
        assert!(hair_png_prompt("fade", Gender::Neutral).contains("unisex"));
    }
}
