/// Application name
pub const APP_NAME: &str = "Wayfare";

/// Default number of reels requested per feed page
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Largest page size the backend accepts
pub const MAX_PAGE_SIZE: u32 = 50;

/// Title shown when a record carries none
pub const DEFAULT_REEL_TITLE: &str = "Travel Story";

/// Location label shown when no place field is present
pub const DEFAULT_REEL_LOCATION: &str = "Worldwide";

/// Thumbnail used when a record carries no image reference
pub const DEFAULT_THUMBNAIL_URL: &str = "https://static.wayfare.app/reels/placeholder.jpg";

/// Avatar used when a creator record carries no image reference
pub const DEFAULT_AVATAR_URL: &str = "https://static.wayfare.app/avatars/placeholder.png";

/// Dwell time a visibility candidate must hold before playback switches
pub const SETTLE_DEBOUNCE_MS: u64 = 120;

/// How close to the feed tail (in remaining cards) the next page is fetched
pub const TRAILING_FETCH_THRESHOLD: usize = DEFAULT_PAGE_SIZE as usize;

/// Capacity of the session intent / event channels
pub const CHANNEL_CAPACITY: usize = 256;

/// Default timeout for one backend request in milliseconds
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
