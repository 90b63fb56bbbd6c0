use darkroom_core::options::EditorOptions;

const DOCUMENTATION: &str = r##"# Darkroom preferences. You may edit this file, but be aware that formatting and comments will not
# be preserved, and all keys and values are case sensitive.

# `assets_dir` is where mockup `image_url`s are looked up. Relative to this file's directory if unset.
# [editor] holds the editor options. Any option left out takes its default.

# Examples:
# [editor]
# canvas_size = [985, 1271]
# export_size = [1970, 2542]
# export_resolution = "300dpi"
# tools = "MOVE | BRUSH | TEXT"
# font_path = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"
#
# [editor.brush]
# color = "#ffffff"
# width = 4.0
#
# [[editor.mockups]]
# side = "front"
# image_url = "mockups/tee-front.png"
#
# [[editor.mockups]]
# side = "back"
# variant_id = "navy"
# image_url = "mockups/tee-navy-back.png"

"##;

#[must_use]
pub fn preferences_dir() -> Option<std::path::PathBuf> {
    let mut base_dir = dirs::preference_dir()?;
    base_dir.push(env!("CARGO_PKG_NAME"));
    Some(base_dir)
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Preferences {
    #[serde(skip)]
    failed_to_load: bool,
    pub assets_dir: Option<std::path::PathBuf>,
    pub editor: EditorOptions,
}
impl Preferences {
    const FILENAME: &'static str = "darkroom.toml";
    /// Shared global preferences, loaded from the user's preferences directory.
    /// (Or defaulted, if unavailable for some reason)
    #[must_use]
    pub fn get() -> &'static Self {
        static GLOBAL_PREFERENCES: std::sync::OnceLock<Preferences> = std::sync::OnceLock::new();

        GLOBAL_PREFERENCES.get_or_init(|| match preferences_dir() {
            None => Self::no_path(),
            Some(mut dir) => {
                dir.push(Self::FILENAME);
                Self::load_or_default(&dir)
            }
        })
    }
    #[must_use]
    pub fn no_path() -> Self {
        log::warn!("Preferences weren't available, defaulting.");
        Self {
            failed_to_load: true,
            ..Default::default()
        }
    }
    /// Read preferences from a file. Anything unreadable, unparsable, or unusable falls back to
    /// defaults in full.
    #[must_use]
    pub fn load_or_default(path: &std::path::Path) -> Self {
        let preferences: anyhow::Result<Self> = try_block::try_block! {
            let string = std::fs::read_to_string(path)?;
            let preferences : Self = toml::from_str(&string)?;
            preferences.editor.validate()?;

            Ok(preferences)
        };

        match preferences {
            Ok(preferences) => {
                log::info!("Loaded preferences from {}", path.display());
                preferences
            }
            Err(e) => {
                log::warn!("Failed to load {}: {e:#}", path.display());
                Self::no_path()
            }
        }
    }
    /// Return true if loading user's settings failed. This can be useful for
    /// displaying a warning.
    #[must_use]
    pub fn did_fail_to_load(&self) -> bool {
        self.failed_to_load
    }
    /// Directory that mockup URLs resolve against.
    #[must_use]
    pub fn assets_dir(&self) -> std::path::PathBuf {
        let base = preferences_dir().unwrap_or_default();
        match &self.assets_dir {
            Some(dir) => base.join(dir),
            None => base,
        }
    }
    pub fn save(&self) -> anyhow::Result<()> {
        let mut preferences =
            preferences_dir().ok_or_else(|| anyhow::anyhow!("No preferences dir found"))?;
        // Explicity do *not* create recursively. If not found, the user probably has a good reason.
        // Ignore errors (could already exist). Any real errors will be emitted by file access below.
        let _ = std::fs::DirBuilder::new().create(&preferences);

        preferences.push(Self::FILENAME);
        self.save_to(&preferences)
    }
    /// Write to `path`. A file these preferences failed to load from is left alone, as it's
    /// likely a hand edit with a mistake in it.
    fn save_to(&self, path: &std::path::Path) -> anyhow::Result<()> {
        if self.failed_to_load && path.exists() {
            anyhow::bail!("not overwriting unreadable {}", path.display());
        }
        std::fs::write(path, self.to_documented_toml()?)?;
        Ok(())
    }
    fn to_documented_toml(&self) -> anyhow::Result<String> {
        let string = toml::ser::to_string_pretty(self)?;
        // Prefix some documentation.
        Ok(DOCUMENTATION.to_owned() + &string)
    }
}

#[cfg(test)]
mod test {
    use super::Preferences;
    use darkroom_core::state::Side;

    fn temp_file(name: &str, contents: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("darkroom-prefs-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn loads_partial_file() {
        let path = temp_file(
            "partial.toml",
            r##"
            assets_dir = "shop-assets"

            [editor]
            min_size = 10.0

            [[editor.mockups]]
            side = "back"
            image_url = "back.png"
            "##,
        );
        let preferences = Preferences::load_or_default(&path);
        assert!(!preferences.did_fail_to_load());
        assert_eq!(preferences.editor.min_size, 10.0);
        assert_eq!(preferences.editor.canvas_size, [985, 1271]);
        assert_eq!(preferences.editor.mockups[0].side, Side::Back);
        assert!(preferences.assets_dir().ends_with("shop-assets"));
    }
    #[test]
    fn invalid_files_fall_back() {
        let garbage = temp_file("garbage.toml", "editor = 5");
        assert!(Preferences::load_or_default(&garbage).did_fail_to_load());

        let unusable = temp_file("unusable.toml", "[editor]\ndefault_fit = 3.0\n");
        let preferences = Preferences::load_or_default(&unusable);
        assert!(preferences.did_fail_to_load());
        assert_eq!(preferences.editor.default_fit, 0.5);

        let missing = std::env::temp_dir().join("darkroom-prefs-does-not-exist.toml");
        assert!(Preferences::load_or_default(&missing).did_fail_to_load());
    }
    #[test]
    fn broken_file_is_not_overwritten() {
        let contents = "[editor]\ndefault_fit = 3.0\n\n[[editor.mockups]]\nside = \"front\"\nimage_url = \"my-shirt.png\"\n";
        let path = temp_file("broken.toml", contents);
        let preferences = Preferences::load_or_default(&path);
        assert!(preferences.did_fail_to_load());
        assert!(preferences.save_to(&path).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), contents);

        // Nothing to lose when there was no file.
        let fresh = path.with_file_name("fresh.toml");
        let _ = std::fs::remove_file(&fresh);
        let preferences = Preferences::load_or_default(&fresh);
        preferences.save_to(&fresh).unwrap();
        assert!(!Preferences::load_or_default(&fresh).did_fail_to_load());
    }
    #[test]
    fn documented_output_reads_back() {
        let preferences = Preferences::default();
        let text = preferences.to_documented_toml().unwrap();
        assert!(text.starts_with("# Darkroom preferences."));
        let back: Preferences = toml::from_str(&text).unwrap();
        assert_eq!(back, preferences);
    }
}
