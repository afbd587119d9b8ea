use crate::model::Action;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

pub(crate) const IDLE_IMAGES: [&str; 3] = ["idle.png", "idle2.png", "idle3.png"];
pub(crate) const SLEEP_IMAGES: [&str; 3] = ["sleeping.png", "sleeping2.png", "sleeping3.png"];
pub(crate) const PLAY_IMAGES: [&str; 2] = ["playing.png", "playing2.png"];
pub(crate) const HUNGRY_IMAGE: &str = "hungry.png";
pub(crate) const EAT_IMAGE: &str = "eating.png";

/// Everything fetched at startup, including variants no action shows yet.
pub(crate) const PRELOAD_IMAGES: [&str; 12] = [
    "idle.png",
    "idle2.png",
    "idle3.png",
    "eating.png",
    "eating2.png",
    "eating3.png",
    "sleeping.png",
    "sleeping2.png",
    "sleeping3.png",
    "hungry.png",
    "playing.png",
    "playing2.png",
];

pub(crate) fn variants(action: Action) -> &'static [&'static str] {
    match action {
        Action::Idle => &IDLE_IMAGES,
        Action::Sleep => &SLEEP_IMAGES,
        Action::Play => &PLAY_IMAGES,
        Action::Hungry => &[HUNGRY_IMAGE],
        Action::Eat => &[EAT_IMAGE],
    }
}

/// Picks the asset shown for `action`. Call once per action change; the pick
/// is meant to stay on screen until the action changes again.
pub(crate) fn resolve_image<R: Rng + ?Sized>(action: Action, rng: &mut R) -> &'static str {
    variants(action)
        .choose(rng)
        .copied()
        .unwrap_or(IDLE_IMAGES[0])
}

pub(crate) fn resolve_image_seeded(action: Action, seed: u64) -> &'static str {
    resolve_image(action, &mut StdRng::seed_from_u64(seed))
}
