// Contrast-aware marker color for center dots.

use crate::surface::Surface;
use crate::theme::Rgb;

pub const SAMPLE_RADIUS: i32 = 2;
const GREEN_DISTANCE_THRESHOLD: f64 = 100.0;

/// Green, unless the local background is already close to green, in which
/// case magenta.
pub fn adaptive_marker_color<S: Surface + ?Sized>(surface: &S, x: i32, y: i32) -> Rgb {
    let Some(mean) = surface.sample_region(x, y, SAMPLE_RADIUS) else {
        return Rgb::GREEN;
    };
    marker_color_for_background(mean.to_rgb())
}

pub fn marker_color_for_background(mean: [f64; 3]) -> Rgb {
    if distance_to_green(mean) < GREEN_DISTANCE_THRESHOLD {
        Rgb::MAGENTA
    } else {
        Rgb::GREEN
    }
}

fn distance_to_green([r, g, b]: [f64; 3]) -> f64 {
    let green = Rgb::GREEN;
    let dr = r - green.r() as f64;
    let dg = g - green.g() as f64;
    let db = b - green.b() as f64;
    (dr * dr + dg * dg + db * db).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::MeanColor;
    use crate::surface::recording::RecordingSurface;

    fn uniform(color: MeanColor) -> RecordingSurface {
        RecordingSurface::new(50, 50).with_background(color)
    }

    #[test]
    fn green_background_gets_magenta() {
        let surface = uniform(MeanColor::Rgb([0.0, 255.0, 0.0]));
        assert_eq!(adaptive_marker_color(&surface, 10, 10), Rgb::MAGENTA);
    }

    #[test]
    fn white_background_gets_green() {
        let surface = uniform(MeanColor::Rgb([255.0, 255.0, 255.0]));
        assert_eq!(adaptive_marker_color(&surface, 10, 10), Rgb::GREEN);
    }

    #[test]
    fn single_channel_mean_is_replicated() {
        // Gray 200 is far from green on the replicated triple.
        let surface = uniform(MeanColor::Luma(200.0));
        assert_eq!(adaptive_marker_color(&surface, 3, 3), Rgb::GREEN);
    }

    #[test]
    fn threshold_is_strict() {
        assert_eq!(marker_color_for_background([99.9, 255.0, 0.0]), Rgb::MAGENTA);
        assert_eq!(marker_color_for_background([100.0, 255.0, 0.0]), Rgb::GREEN);
        assert_eq!(marker_color_for_background([60.0, 180.0, 0.0]), Rgb::MAGENTA);
    }

    #[test]
    fn point_outside_surface_defaults_to_green() {
        let surface = uniform(MeanColor::Rgb([0.0, 255.0, 0.0]));
        assert_eq!(adaptive_marker_color(&surface, 500, 500), Rgb::GREEN);
    }
}
