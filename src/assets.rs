use crate::images::PRELOAD_IMAGES;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub(crate) type Sprite = Vec<String>;

/// Sprites for every preloaded image, keyed by asset path.
pub(crate) struct AssetCache {
    sprites: HashMap<&'static str, Sprite>,
}

impl AssetCache {
    /// Loads every asset once. A `<stem>.txt` file in `overrides` replaces the
    /// built-in art for that asset; anything missing quietly keeps the default.
    pub(crate) fn preload(overrides: Option<&Path>) -> Self {
        let mut sprites = HashMap::new();
        let mut replaced = 0;
        for &name in PRELOAD_IMAGES.iter() {
            let sprite = match overrides.and_then(|dir| read_override(dir, name)) {
                Some(s) => {
                    replaced += 1;
                    s
                }
                None => builtin(name).iter().map(|l| l.to_string()).collect(),
            };
            sprites.insert(name, sprite);
        }
        log::info!(
            "preloaded {} sprites ({replaced} from overrides)",
            sprites.len()
        );
        Self { sprites }
    }

    pub(crate) fn sprite(&self, name: &str) -> &[String] {
        self.sprites
            .get(name)
            .or_else(|| self.sprites.get("idle.png"))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn override_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(Path::new(name).with_extension("txt"))
}

fn read_override(dir: &Path, name: &str) -> Option<Sprite> {
    let path = override_path(dir, name);
    match fs::read_to_string(&path) {
        Ok(s) => {
            let lines: Sprite = s.lines().map(str::to_string).collect();
            (!lines.is_empty()).then_some(lines)
        }
        Err(e) => {
            log::debug!("no override at {}: {e}", path.display());
            None
        }
    }
}

fn builtin(name: &str) -> &'static [&'static str] {
    match name {
        "idle.png" => &[
            "   .-\"\"\"-.   ",
            "  /  o o  \\  ",
            " |    ^    | ",
            " |  \\___/  | ",
            "  \\       /  ",
            "   '-._.-'   ",
            "    /   \\    ",
        ],
        "idle2.png" => &[
            "   .-\"\"\"-.   ",
            "  /  ^ ^  \\  ",
            " |    o    | ",
            " |  \\___/  | ",
            "  \\       /  ",
            "   '-._.-'   ",
            "   _/   \\_   ",
        ],
        "idle3.png" => &[
            "   .-\"\"\"-.  ?",
            "  /  o o  \\  ",
            " |    -    | ",
            " |   ---   | ",
            "  \\       /  ",
            "   '-._.-'   ",
            "    |   |    ",
        ],
        "eating.png" => &[
            "   .-\"\"\"-.   ",
            "  /  > <  \\  ",
            " |    ^    | ",
            " |  ( O )  |@",
            "  \\       /  ",
            "   '-._.-'   ",
            "    /   \\    ",
        ],
        "eating2.png" => &[
            "   .-\"\"\"-.   ",
            "  /  ^ ^  \\  ",
            " |    ^    | ",
            " |  (ooo)  |*",
            "  \\       /  ",
            "   '-._.-'   ",
            "    /   \\    ",
        ],
        "eating3.png" => &[
            "   .-\"\"\"-.   ",
            "  /  - -  \\  ",
            " |    ^    | ",
            " |  \\_~_/  | ",
            "  \\       /  ",
            "   '-._.-'   ",
            "    /   \\    ",
        ],
        "sleeping.png" => &[
            "          z  ",
            "   .-\"\"\"-. Z ",
            "  /  - -  \\  ",
            " |    .    | ",
            "  \\       /  ",
            "   '-._.-'   ",
            " ~~~~~~~~~~~ ",
        ],
        "sleeping2.png" => &[
            "        Z    ",
            "   .-\"\"\"-.z  ",
            "  /  _ _  \\  ",
            " |    o    | ",
            "  \\       /  ",
            "   '-._.-'   ",
            " ~~~~~~~~~~~ ",
        ],
        "sleeping3.png" => &[
            "            z",
            "   .-\"\"\"-.  Z",
            "  /  u u  \\  ",
            " |   ...   | ",
            "  \\       /  ",
            "   '-._.-'   ",
            " ~~~~~~~~~~~ ",
        ],
        "hungry.png" => &[
            "   .-\"\"\"-.   ",
            "  /  ; ;  \\  ",
            " |    ^    | ",
            " |   /~\\   | ",
            "  \\       /  ",
            "   '-._.-'   ",
            "  [ FOOD? ]  ",
        ],
        "playing.png" => &[
            " \\ .-\"\"\"-. / ",
            "  /  ^ ^  \\  ",
            " |    v    | ",
            " |  \\___/  | ",
            "  \\       /  ",
            "   '-._.-'  o",
            "   /     \\   ",
        ],
        "playing2.png" => &[
            "o  .-\"\"\"-.   ",
            "  /  * *  \\  ",
            " |    v    | ",
            " |  \\___/  | ",
            "  \\       / /",
            "   '-._.-'   ",
            "    \\   /    ",
        ],
        _ => &[],
    }
}
