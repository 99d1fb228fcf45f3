use garde::Validate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Optional generation parameters forwarded to the provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerationSettings {
    pub seed: Option<i64>,
    pub output_format: Option<String>,
    pub size: Option<String>,
    pub quality: Option<String>,
}

/// Body shared by the three `generate*` endpoints.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerateRequest {
    /// Source photo as a data URI (bare base64 is tolerated).
    #[garde(length(min = 1))]
    pub image: String,

    #[garde(length(min = 1, max = 4000))]
    pub prompt: String,

    #[garde(skip)]
    pub style_id: Option<String>,

    #[garde(skip)]
    pub settings: GenerationSettings,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub success: bool,
    pub result_image: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Neutral,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct HairPngRequest {
    #[garde(length(min = 1, max = 2000))]
    pub style_prompt: String,

    #[garde(skip)]
    pub gender: Gender,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HairPngResponse {
    pub success: bool,
    pub hair_png_url: String,
    pub has_transparency: bool,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct UploadRequest {
    #[garde(length(min = 1, max = 512))]
    pub file_name: String,

    /// Base64 payload, optionally wrapped in a data URI.
    #[garde(length(min = 1))]
    pub image_data: String,

    #[garde(skip)]
    pub content_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub url: String,
    pub file_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generate_request_from_camel_case() {
        let req: GenerateRequest = serde_json::from_value(json!({
            "image": "data:image/png;base64,AAAA",
            "prompt": "curtain bangs",
            "styleId": "bangs-01",
            "settings": { "seed": 7, "outputFormat": "webp", "unknown": true }
        }))
        .unwrap();
        assert_eq!(req.style_id.as_deref(), Some("bangs-01"));
        assert_eq!(req.settings.seed, Some(7));
        assert_eq!(req.settings.output_format.as_deref(), Some("webp"));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_missing_prompt_fails_validation() {
        let req: GenerateRequest =
            serde_json::from_value(json!({ "image": "data:image/png;base64,AAAA" })).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_gender_defaults_to_neutral() {
        let req: HairPngRequest =
            serde_json::from_value(json!({ "stylePrompt": "buzz cut" })).unwrap();
        assert_eq!(req.gender, Gender::Neutral);

        let req: HairPngRequest =
            serde_json::from_value(json!({ "stylePrompt": "bob", "gender": "female" })).unwrap();
        assert_eq!(req.gender, Gender::Female);
    }

    #[test]
    fn test_hair_png_response_shape() {
        let body = serde_json::to_value(HairPngResponse {
            success: true,
            hair_png_url: "data:image/png;base64,AAAA".into(),
            has_transparency: false,
        })
        .unwrap();
        assert_eq!(
            body,
            json!({
                "success": true,
                "hairPngUrl": "data:image/png;base64,AAAA",
                "hasTransparency": false
            })
        );
    }

    #[test]
    fn test_upload_request_requires_file_name_and_data() {
        let req: UploadRequest = serde_json::from_value(json!({ "imageData": "AAAA" })).unwrap();
        assert!(req.validate().is_err());

        let req: UploadRequest = serde_json::from_value(json!({ "fileName": "a.png" })).unwrap();
        assert!(req.validate().is_err());
    }
}
