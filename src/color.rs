use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::StructureKind;

// ---------------------------------------------------------------------------
// Row tint by structural type
// ---------------------------------------------------------------------------

const SERIAL_HUE: f32 = 220.0;
const PARALLEL_HUE: f32 = 135.0;

/// Background tint for a row of the given kind: very light blue for serial,
/// very light green for parallel, nothing for unrecognised types.
///
/// `dark` returns a muted, low-lightness variant for dark UI themes.
pub fn type_tint(kind: StructureKind, dark: bool) -> Option<[u8; 3]> {
    let hue = match kind {
        StructureKind::Serial => SERIAL_HUE,
        StructureKind::Parallel => PARALLEL_HUE,
        StructureKind::Other => return None,
    };
    let (saturation, lightness) = if dark { (0.35, 0.22) } else { (1.0, 0.975) };
    let rgb: Srgb = Hsl::new(hue, saturation, lightness).into_color();
    Some([
        channel(rgb.red),
        channel(rgb.green),
        channel(rgb.blue),
    ])
}

/// `#RRGGBB` for HTML output.
pub fn hex([r, g, b]: [u8; 3]) -> String {
    format!("#{r:02X}{g:02X}{b:02X}")
}

fn channel(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_light_tints_are_pale_and_distinct() {
        let serial = type_tint(StructureKind::Serial, false).unwrap();
        let parallel = type_tint(StructureKind::Parallel, false).unwrap();
        assert_ne!(serial, parallel);

        // Blue dominates the serial tint, green the parallel one.
        assert!(serial[2] > serial[0] && serial[2] >= serial[1]);
        assert!(parallel[1] > parallel[0] && parallel[1] > parallel[2]);

        for c in serial.iter().chain(parallel.iter()) {
            assert!(*c >= 230, "tint should be very light: {serial:?} {parallel:?}");
        }
    }

    #[test]
    fn test_dark_tints_are_dark() {
        let serial = type_tint(StructureKind::Serial, true).unwrap();
        assert!(serial.iter().all(|c| *c < 128));
    }

    #[test]
    fn test_other_kind_has_no_tint() {
        assert_eq!(type_tint(StructureKind::Other, false), None);
    }

    #[test]
    fn test_hex() {
        assert_eq!(hex([0xF3, 0xF7, 0xFF]), "#F3F7FF");
        assert_eq!(hex([0, 10, 255]), "#000AFF");
    }
}
