//! Spawn form parsing

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Slug requested when the form carries no profile
pub const DEFAULT_PROFILE_SLUG: &str = "cpu-default";

/// Submitted form fields. Each key may carry several values; the first wins.
pub type FormData = HashMap<String, Vec<String>>;

/// Options a user picked on the spawn form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserOptions {
    pub profile: String,
    /// Admin-only image override
    #[serde(default)]
    pub custom_image: Option<String>,
    /// Admin-only GPU count override; 0 means no override
    #[serde(default)]
    pub custom_gpus: u32,
}

impl Default for UserOptions {
    fn default() -> Self {
        Self {
            profile: DEFAULT_PROFILE_SLUG.to_string(),
            custom_image: None,
            custom_gpus: 0,
        }
    }
}

/// Parse form data into spawner options.
///
/// Never fails: a blank image becomes `None` and a GPU count that is not a
/// plain decimal number becomes 0.
pub fn options_from_form(form: &FormData) -> UserOptions {
    let profile = first_value(form, "profile").unwrap_or(DEFAULT_PROFILE_SLUG);
    let custom_image = first_value(form, "custom_image").unwrap_or("").trim();
    let custom_gpus = first_value(form, "custom_gpus").unwrap_or("0");

    UserOptions {
        profile: profile.to_string(),
        custom_image: (!custom_image.is_empty()).then(|| custom_image.to_string()),
        custom_gpus: parse_gpu_count(custom_gpus),
    }
}

fn first_value<'a>(form: &'a FormData, key: &str) -> Option<&'a str> {
    form.get(key)
        .and_then(|values| values.first())
        .map(String::as_str)
}

fn parse_gpu_count(raw: &str) -> u32 {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return 0;
    }
    raw.parse().unwrap_or(0)
}
