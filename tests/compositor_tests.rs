//! Integration tests for the compositors.
//!
//! Exercises the public compositing API end to end:
//! - GreenCorrector - weighted band sums
//! - BackgroundCompositor - substitution, overlay and alpha blending
//! - load_compositors() - compositors built from YAML definitions

use ndarray::{Array2, Array3, Axis, array, stack};
use satpy_core::Error;
use satpy_core::composites::{
    BackgroundCompositor, Band, BandImage, Compositor, GreenCorrector, Mode, load_compositors,
};
use serde_json::json;
use tempfile::TempDir;

fn constant(value: f64) -> BandImage {
    BandImage::single(Array2::from_elem((4, 5), value))
}

fn assert_all(image: &BandImage, expected: f64) {
    for &value in image.data() {
        assert_eq!(value, expected);
    }
}

#[test]
fn test_green_corrector_constant_inputs() {
    let corrector = GreenCorrector::new("green");
    let image = corrector.compose(&[constant(10.0), constant(20.0)]).unwrap();
    assert_eq!(image.shape(), (4, 5));
    for &value in image.data() {
        assert!((value - 11.5).abs() < 1e-12);
    }
}

#[test]
fn test_background_fills_missing_foreground() {
    let compositor = BackgroundCompositor::new("clouds_over_background");
    let image = compositor
        .compose(&[constant(f64::NAN), constant(0.0)])
        .unwrap();
    assert_all(&image, 0.0);
}

#[test]
fn test_background_overlay_dark() {
    let compositor = BackgroundCompositor::new("overlay").with_overlay(true);
    let image = compositor.compose(&[constant(0.7), constant(0.3)]).unwrap();
    assert_all(&image, 2.0 * 0.3 * 0.7);
}

#[test]
fn test_rgba_foreground_over_luminance_background() {
    let compositor = BackgroundCompositor::new("clouds_over_background");
    let red = array![[1.0, 1.0]];
    let green = array![[0.5, 0.5]];
    let blue = array![[0.0, 0.0]];
    let alpha = array![[1.0, 0.25]];
    let fg = BandImage::new(
        stack(
            Axis(0),
            &[red.view(), green.view(), blue.view(), alpha.view()],
        )
        .unwrap(),
        Mode::RGBA,
    )
    .unwrap();
    let bg = BandImage::single(array![[0.2, 0.2]]);

    let image = compositor.compose(&[fg, bg]).unwrap();
    assert_eq!(image.mode(), Mode::RGB);
    assert_eq!(
        image.band(Band::R).unwrap(),
        array![[1.0, 1.0 * 0.25 + 0.2 * (1.0 - 0.25)]]
    );
    assert_eq!(
        image.band(Band::B).unwrap(),
        array![[0.0, 0.0 * 0.25 + 0.2 * (1.0 - 0.25)]]
    );
}

#[test]
fn test_metadata_flows_to_output() {
    let compositor = BackgroundCompositor::new("clouds_over_background");
    let fg = constant(0.5)
        .with_attr("sensor", "ahi")
        .with_attr("platform_name", "Himawari-8")
        .with_attr("start_time", "2021-06-01T03:00:00")
        .with_attr("end_time", "2021-06-01T03:10:00");
    let bg = constant(0.1)
        .with_attr("sensor", "ahi")
        .with_attr("platform_name", "Himawari-8")
        .with_attr("start_time", "2021-06-01T02:50:00")
        .with_attr("end_time", "2021-06-01T03:05:00");

    let image = compositor.compose(&[fg, bg]).unwrap();
    assert_eq!(image.attrs["sensor"], json!("ahi"));
    assert_eq!(image.attrs["platform_name"], json!("Himawari-8"));
    assert_eq!(image.attrs["start_time"], json!("2021-06-01T02:50:00"));
    assert_eq!(image.attrs["end_time"], json!("2021-06-01T03:10:00"));
    assert_eq!(image.attrs["name"], json!("clouds_over_background"));
}

#[test]
fn test_compositor_errors() {
    let green = GreenCorrector::new("green");
    assert!(matches!(
        green.compose(&[constant(1.0)]),
        Err(Error::FractionsMismatch { .. })
    ));

    let background = BackgroundCompositor::new("bg");
    assert!(matches!(
        background.compose(&[constant(1.0), constant(1.0), constant(1.0)]),
        Err(Error::InputCount { .. })
    ));

    let small = BandImage::single(Array2::zeros((2, 2)));
    assert!(matches!(
        background.compose(&[constant(1.0), small]),
        Err(Error::IncompatibleAreas(_))
    ));

    let other_area = constant(1.0).with_attr("area", "euro4");
    let this_area = constant(1.0).with_attr("area", "himawari_fd");
    assert!(matches!(
        green.compose(&[other_area, this_area]),
        Err(Error::IncompatibleAreas(_))
    ));
}

#[test]
fn test_compositors_are_shareable() {
    fn assert_send_sync<T: Send + Sync>(_: &T) {}
    let boxed: Vec<Box<dyn Compositor>> = vec![
        Box::new(GreenCorrector::new("green")),
        Box::new(BackgroundCompositor::new("bg")),
    ];
    assert_send_sync(&boxed);

    let handles: Vec<_> = (0..2)
        .map(|i| {
            std::thread::spawn(move || {
                GreenCorrector::new("green")
                    .compose(&[constant(i as f64), constant(0.0)])
                    .unwrap()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap().mode(), Mode::L);
    }
}

#[test]
fn test_definitions_from_yaml() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("seviri.yaml");
    std::fs::write(
        &path,
        "sensor_name: visir/seviri\n\
         composites:\n  \
           overview_on_land:\n    \
             compositor: BackgroundCompositor\n    \
             overlay: false\n    \
             standard_name: overview\n",
    )
    .unwrap();

    let compositors = load_compositors(&path).unwrap();
    let compositor = &compositors["overview_on_land"];
    let fg = BandImage::new(Array3::from_elem((3, 1, 1), f64::NAN), Mode::RGB).unwrap();
    let bg = BandImage::new(Array3::from_elem((3, 1, 1), 0.4), Mode::RGB).unwrap();
    let image = compositor.compose(&[fg, bg]).unwrap();
    assert_all(&image, 0.4);
    assert_eq!(image.attrs["standard_name"], json!("overview"));
}
