//! Property tests for the frame bit packing.

use oled_1in51::frame::encode;
use oled_1in51::{Geometry, LumaImage};
use proptest::prelude::*;

const WIDTH: usize = 128;
const HEIGHT: usize = 64;

proptest! {
    /// Every pixel of a native-size image decodes back to its own state.
    #[test]
    fn native_encoding_roundtrips(pixels in prop::collection::vec(any::<bool>(), WIDTH * HEIGHT)) {
        let luma: Vec<u8> = pixels.iter().map(|&lit| if lit { 0x00 } else { 0xFF }).collect();
        let image = LumaImage::new(WIDTH as u32, HEIGHT as u32, &luma).unwrap();
        let frame = encode(Geometry::OLED_1IN51, &image).into_frame();

        prop_assert_eq!(frame.as_bytes().len(), WIDTH / 8 * HEIGHT);
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                prop_assert_eq!(frame.is_lit(x as u32, y as u32), Some(pixels[y * WIDTH + x]));
            }
        }
    }

    /// Sizes matching neither orientation never light anything.
    #[test]
    fn mismatched_sizes_stay_blank(width in 1u32..200, height in 1u32..200) {
        prop_assume!((width, height) != (128, 64) && (width, height) != (64, 128));
        let luma = vec![0u8; (width * height) as usize];
        let image = LumaImage::new(width, height, &luma).unwrap();
        let encoded = encode(Geometry::OLED_1IN51, &image);
        prop_assert!(encoded.diagnostic().is_some());
        prop_assert!(encoded.frame().as_bytes().iter().all(|&b| b == 0xFF));
    }
}
