//! Skin configuration shipped inside beatmap archives.

pub mod ini;
pub mod normalize;

pub use ini::{IniSection, SkinIni};
pub use normalize::normalize;

use crate::error::Result;

/// Conventional file name of a skin configuration inside an archive.
pub const SKIN_FILE: &str = "skin.ini";

/// Normalizes dialect text and parses the result.
pub fn load_skin(raw: &str) -> Result<SkinIni> {
    let normalized = normalize(raw)?;
    Ok(SkinIni::parse(&normalized))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_skin() {
        let skin = load_skin("[General]\nName: test\n[Mania]\nKeys: 4\nColourLight1: 10,20,30\n").unwrap();
        assert_eq!(skin.mania(4).and_then(|s| s.colour("ColourLight1")), Some([10, 20, 30, 255]));
    }

    #[test]
    fn test_load_skin_with_bom() {
        let skin = load_skin("\u{feff}[Mania]\r\nKeys: 4\r\nColourLight1: 1,2,3\r\n").unwrap();
        assert!(skin.mania(4).is_some());
        assert!(load_skin("\u{feff}[Mania]\r\nColumnWidth: 40").is_err());
    }
}
