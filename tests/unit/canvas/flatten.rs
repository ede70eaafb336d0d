use image::Luma;

use super::*;

#[test]
fn flatten_reads_one_component_per_plane() {
    let r = GrayImage::from_fn(2, 1, |x, _| Luma([10 + x as u8]));
    let g = GrayImage::from_pixel(2, 1, Luma([20]));
    let b = GrayImage::from_pixel(2, 1, Luma([30]));
    let a = GrayImage::from_pixel(2, 1, Luma([255]));

    let out = flatten([&r, &g, &b, &a]).unwrap();
    assert_eq!(out.dimensions(), (2, 1));
    assert_eq!(out.get_pixel(0, 0).0, [10, 20, 30, 255]);
    assert_eq!(out.get_pixel(1, 0).0, [11, 20, 30, 255]);
}

#[test]
fn flatten_rejects_mismatched_planes() {
    let small = GrayImage::new(1, 1);
    let big = GrayImage::new(2, 2);
    let err = flatten([&small, &small, &big, &small]).unwrap_err();
    assert!(err.to_string().contains("validation error:"));
}
