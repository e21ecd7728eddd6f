//! Normalizes loosely-typed backend reel records into [`ReelCard`]s.
//!
//! The backend evolved across several record shapes (`videoUrl` vs
//! `video_url`, `creator` vs `user`, counts as numbers or numeric
//! strings), so every field is read through an alias list with a
//! documented fallback.  Mapping is total: any JSON value becomes a card,
//! and a malformed record can never take down a whole page.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use wayfare_shared::constants::{
    DEFAULT_AVATAR_URL, DEFAULT_REEL_LOCATION, DEFAULT_REEL_TITLE, DEFAULT_THUMBNAIL_URL,
};
use wayfare_shared::{Creator, EngagementCounts, ReelCard, ReelId};

const THUMBNAIL_KEYS: &[&str] = &["thumbnail", "thumbnail_url", "thumbnailUrl", "image"];
const MEDIA_KEYS: &[&str] = &["videoUrl", "video_url", "mediaUrl", "media_url"];
const LOCATION_KEYS: &[&str] = &["location", "city", "country", "description"];
const LIKED_KEYS: &[&str] = &["isLiked", "liked", "viewer_has_liked"];
const AVATAR_KEYS: &[&str] = &["avatar", "avatar_url", "avatarUrl"];
const DURATION_KEYS: &[&str] = &["duration", "duration_secs"];
const CREATED_KEYS: &[&str] = &["created_at", "createdAt"];

/// Map one raw backend record to a canonical card.
///
/// Never fails.  Absent, null or wrongly-typed fields take their
/// documented default instead of poisoning the record.
pub fn map_record(raw: &Value) -> ReelCard {
    ReelCard {
        id: ReelId::new(coerce_id(raw.get("id"))),
        title: string_field(raw, &["title"]).unwrap_or_else(|| DEFAULT_REEL_TITLE.to_string()),
        description: string_field(raw, &["description"]).unwrap_or_default(),
        location: string_field(raw, LOCATION_KEYS)
            .unwrap_or_else(|| DEFAULT_REEL_LOCATION.to_string()),
        thumbnail_url: string_field(raw, THUMBNAIL_KEYS)
            .unwrap_or_else(|| DEFAULT_THUMBNAIL_URL.to_string()),
        media_url: string_field(raw, MEDIA_KEYS),
        counts: EngagementCounts {
            likes: coerce_count(raw.get("likes")),
            comments: coerce_count(raw.get("comments")),
            shares: coerce_count(raw.get("shares")),
            views: coerce_count(raw.get("views")),
        },
        viewer_has_liked: LIKED_KEYS.iter().any(|k| coerce_bool(raw.get(*k))),
        creator: map_creator(raw),
        tags: map_tags(raw.get("tags")),
        duration_secs: DURATION_KEYS
            .iter()
            .find_map(|k| coerce_non_negative(raw.get(*k)))
            .unwrap_or(0.0),
        created_at: CREATED_KEYS.iter().find_map(|k| parse_timestamp(raw.get(*k))),
    }
}

/// The id is the only field with no sensible invented default.  Numbers
/// are stringified; anything else becomes the empty id, which downstream
/// de-duplication collapses.
fn coerce_id(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// First non-empty string among the aliases, trimmed.
fn string_field(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match raw.get(*key) {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        _ => None,
    })
}

/// Uniform count coercion: JSON numbers and numeric strings are accepted,
/// fractions truncate, anything negative or non-finite falls back to zero.
fn coerce_count(value: Option<&Value>) -> u64 {
    coerce_non_negative(value).map(|f| f as u64).unwrap_or(0)
}

/// One numeric rule for counts and durations alike: negative values are
/// as meaningless as `NaN` and take the fallback too.
fn coerce_non_negative(value: Option<&Value>) -> Option<f64> {
    coerce_f64(value).filter(|f| *f >= 0.0)
}

fn coerce_f64(value: Option<&Value>) -> Option<f64> {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite())
}

/// Only a literal JSON `true` counts as liked.  Truthy strings and numbers
/// stay `false` so a schema drift never shows phantom likes.
fn coerce_bool(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::Bool(true)))
}

fn map_creator(raw: &Value) -> Option<Creator> {
    let obj = raw.get("creator").or_else(|| raw.get("user"))?;
    let username = string_field(obj, &["username"])?;
    let avatar_url =
        string_field(obj, AVATAR_KEYS).unwrap_or_else(|| DEFAULT_AVATAR_URL.to_string());
    Some(Creator {
        username,
        avatar_url,
    })
}

fn map_tags(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str())
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

/// The backend emits RFC 3339 with an offset from newer endpoints and a
/// bare ISO timestamp (implicitly UTC) from older ones.
fn parse_timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let text = match value {
        Some(Value::String(s)) => s.trim(),
        _ => return None,
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_record_gets_documented_defaults() {
        let card = map_record(&json!({}));
        assert_eq!(card.id.as_str(), "");
        assert_eq!(card.title, DEFAULT_REEL_TITLE);
        assert_eq!(card.description, "");
        assert_eq!(card.location, DEFAULT_REEL_LOCATION);
        assert_eq!(card.thumbnail_url, DEFAULT_THUMBNAIL_URL);
        assert_eq!(card.media_url, None);
        assert_eq!(card.counts, EngagementCounts::default());
        assert!(!card.viewer_has_liked);
        assert_eq!(card.creator, None);
        assert!(card.tags.is_empty());
        assert_eq!(card.duration_secs, 0.0);
        assert_eq!(card.created_at, None);
    }

    #[test]
    fn test_non_object_record_still_maps() {
        for raw in [json!(null), json!("reel"), json!(17), json!([1, 2])] {
            let card = map_record(&raw);
            assert_eq!(card.title, DEFAULT_REEL_TITLE);
        }
    }

    #[test]
    fn test_full_record_maps_every_field() {
        let raw = json!({
            "id": "reel-42",
            "title": "Alfama at dusk",
            "description": "Tram 28 views",
            "location": "Lisbon, Portugal",
            "videoUrl": "https://cdn.wayfare.app/v/42.mp4",
            "thumbnail": "https://cdn.wayfare.app/t/42.jpg",
            "likes": 128,
            "comments": 7,
            "shares": 3,
            "views": 4096,
            "isLiked": true,
            "duration": 21.5,
            "tags": ["lisbon", "citybreak"],
            "creator": {"username": "ana", "avatar": "https://cdn.wayfare.app/a/ana.png"},
            "created_at": "2024-05-01T09:30:00Z",
        });
        let card = map_record(&raw);
        assert_eq!(card.id.as_str(), "reel-42");
        assert_eq!(card.title, "Alfama at dusk");
        assert_eq!(card.location, "Lisbon, Portugal");
        assert_eq!(card.media_url.as_deref(), Some("https://cdn.wayfare.app/v/42.mp4"));
        assert_eq!(card.counts.likes, 128);
        assert_eq!(card.counts.views, 4096);
        assert!(card.viewer_has_liked);
        assert_eq!(card.duration_secs, 21.5);
        assert_eq!(card.tags, vec!["lisbon", "citybreak"]);
        let creator = card.creator.unwrap();
        assert_eq!(creator.username, "ana");
        assert_eq!(creator.avatar_url, "https://cdn.wayfare.app/a/ana.png");
        assert!(card.created_at.is_some());
    }

    #[test]
    fn test_id_accepts_numbers() {
        assert_eq!(map_record(&json!({"id": 7})).id.as_str(), "7");
        assert_eq!(map_record(&json!({"id": true})).id.as_str(), "");
    }

    #[test]
    fn test_location_alias_chain() {
        assert_eq!(map_record(&json!({"city": "Porto"})).location, "Porto");
        assert_eq!(map_record(&json!({"country": "Japan"})).location, "Japan");
        assert_eq!(
            map_record(&json!({"location": "Kyoto", "country": "Japan"})).location,
            "Kyoto"
        );
        // A caption-only record still gets display text in the location slot.
        assert_eq!(
            map_record(&json!({"description": "Hidden waterfalls"})).location,
            "Hidden waterfalls"
        );
    }

    #[test]
    fn test_blank_strings_fall_through() {
        let card = map_record(&json!({"title": "   ", "location": ""}));
        assert_eq!(card.title, DEFAULT_REEL_TITLE);
        assert_eq!(card.location, DEFAULT_REEL_LOCATION);
    }

    #[test]
    fn test_counts_coerce_uniformly() {
        let raw = json!({
            "likes": "1200",
            "comments": 3.9,
            "shares": "-4",
            "views": "NaN",
        });
        let counts = map_record(&raw).counts;
        assert_eq!(counts.likes, 1200);
        assert_eq!(counts.comments, 3);
        assert_eq!(counts.shares, 0);
        assert_eq!(counts.views, 0);
    }

    #[test]
    fn test_count_rejects_non_numeric_types() {
        let raw = json!({"likes": {"count": 5}, "views": [1]});
        let counts = map_record(&raw).counts;
        assert_eq!(counts.likes, 0);
        assert_eq!(counts.views, 0);
    }

    #[test]
    fn test_duration_coerces_like_counts() {
        assert_eq!(map_record(&json!({"duration": 21.5})).duration_secs, 21.5);
        assert_eq!(map_record(&json!({"duration": "12.5"})).duration_secs, 12.5);
        assert_eq!(map_record(&json!({"duration": -3.5})).duration_secs, 0.0);
        assert_eq!(map_record(&json!({"duration": "NaN"})).duration_secs, 0.0);
        // An unusable alias falls through to the next one.
        assert_eq!(
            map_record(&json!({"duration": -1, "duration_secs": 8})).duration_secs,
            8.0
        );
    }

    #[test]
    fn test_liked_only_from_literal_true() {
        assert!(map_record(&json!({"liked": true})).viewer_has_liked);
        assert!(!map_record(&json!({"liked": "true"})).viewer_has_liked);
        assert!(!map_record(&json!({"isLiked": 1})).viewer_has_liked);
    }

    #[test]
    fn test_creator_requires_username() {
        assert_eq!(map_record(&json!({"creator": {"avatar": "x.png"}})).creator, None);
        let card = map_record(&json!({"user": {"username": "kenji"}}));
        let creator = card.creator.unwrap();
        assert_eq!(creator.username, "kenji");
        assert_eq!(creator.avatar_url, DEFAULT_AVATAR_URL);
    }

    #[test]
    fn test_tags_skip_non_strings_and_keep_order() {
        let card = map_record(&json!({"tags": ["beach", 3, null, "surf", "  "]}));
        assert_eq!(card.tags, vec!["beach", "surf"]);
    }

    #[test]
    fn test_timestamp_accepts_offset_and_naive_forms() {
        let with_offset = map_record(&json!({"created_at": "2024-05-01T09:30:00+02:00"}));
        let naive = map_record(&json!({"createdAt": "2024-05-01T07:30:00.123456"}));
        assert!(with_offset.created_at.is_some());
        assert!(naive.created_at.is_some());
        assert_eq!(map_record(&json!({"created_at": "yesterday"})).created_at, None);
    }
}
