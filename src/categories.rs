//! Static category keys and the promotional media shown with their events.

use once_cell::sync::Lazy;
use std::collections::HashMap;

static MEDIA_LINKS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("yoga", "https://cdn.eventdesk.in/media/categories/yoga.mp4"),
        ("meditation", "https://cdn.eventdesk.in/media/categories/meditation.mp4"),
        ("fitness", "https://cdn.eventdesk.in/media/categories/fitness.mp4"),
        ("nutrition", "https://cdn.eventdesk.in/media/categories/nutrition.jpg"),
        ("workshop", "https://cdn.eventdesk.in/media/categories/workshop.jpg"),
        ("retreat", "https://cdn.eventdesk.in/media/categories/retreat.jpg"),
    ])
});

/// Media link for `category`, or `None` for keys outside the table.
pub fn media_link(category: &str) -> Option<&'static str> {
    MEDIA_LINKS.get(category).copied()
}
