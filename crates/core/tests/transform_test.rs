//! Algebraic properties of affine transforms over seeded random matrices.

mod common;

use common::XorShift64;
use folio_core::geometry::{AffineTransform, Point};

const SAMPLES: usize = 500;
const EPSILON: f64 = 1e-6;

fn random_transform(rng: &mut XorShift64) -> AffineTransform {
    AffineTransform::new(
        rng.range(-3.0, 3.0),
        rng.range(-3.0, 3.0),
        rng.range(-3.0, 3.0),
        rng.range(-3.0, 3.0),
        rng.range(-500.0, 500.0),
        rng.range(-500.0, 500.0),
    )
}

#[test]
fn test_multiplication_is_associative() {
    let mut rng = XorShift64::new(0x5eed_f011_0001);
    for _ in 0..SAMPLES {
        let (a, b, c) = (
            random_transform(&mut rng),
            random_transform(&mut rng),
            random_transform(&mut rng),
        );
        let left = a.multiply(&b).multiply(&c);
        let right = a.multiply(&b.multiply(&c));
        assert!(left.approx_eq(&right, EPSILON), "{left:?} vs {right:?}");
    }
}

#[test]
fn test_product_applies_left_operand_first() {
    let mut rng = XorShift64::new(0x5eed_f011_0002);
    for _ in 0..SAMPLES {
        let (a, b) = (random_transform(&mut rng), random_transform(&mut rng));
        let p = Point::new(rng.range(-100.0, 100.0), rng.range(-100.0, 100.0));
        let sequential = b.transform_point(a.transform_point(p));
        let combined = a.multiply(&b).transform_point(p);
        assert!(sequential.approx_eq(combined, EPSILON));
    }
}

#[test]
fn test_translate_matches_pre_multiplied_translation() {
    let mut rng = XorShift64::new(0x5eed_f011_0003);
    for _ in 0..SAMPLES {
        let m = random_transform(&mut rng);
        let (tx, ty) = (rng.range(-50.0, 50.0), rng.range(-50.0, 50.0));
        let expected = AffineTransform::translation(tx, ty).multiply(&m);
        assert!(m.translate(tx, ty).approx_eq(&expected, EPSILON));
    }
}

#[test]
fn test_inverse_round_trips_points() {
    let mut rng = XorShift64::new(0x5eed_f011_0004);
    let mut checked = 0;
    for _ in 0..SAMPLES {
        let m = random_transform(&mut rng);
        if m.determinant().abs() < 0.1 {
            continue;
        }
        let inverse = m.inverse().expect("determinant is not small");
        let p = Point::new(rng.range(-100.0, 100.0), rng.range(-100.0, 100.0));
        assert!(inverse.transform_point(m.transform_point(p)).approx_eq(p, 1e-6));
        checked += 1;
    }
    assert!(checked > SAMPLES / 2);
}

#[test]
fn test_identity_is_the_unit() {
    let mut rng = XorShift64::new(0x5eed_f011_0005);
    for _ in 0..SAMPLES {
        let m = random_transform(&mut rng);
        assert_eq!(m.multiply(&AffineTransform::IDENTITY), m);
        assert_eq!(AffineTransform::IDENTITY.multiply(&m), m);
    }
}

#[test]
fn test_product_with_inverse_is_identity() {
    let mut rng = XorShift64::new(0x5eed_f011_0006);
    let mut checked = 0;
    for _ in 0..SAMPLES {
        let m = random_transform(&mut rng);
        if m.determinant().abs() < 0.1 {
            continue;
        }
        let inverse = m.inverse().expect("determinant is not small");
        let product = m.multiply(&inverse);
        assert!(
            product.approx_eq(&AffineTransform::IDENTITY, EPSILON),
            "{product:?}"
        );
        assert!(inverse.multiply(&m).approx_eq(&AffineTransform::IDENTITY, EPSILON));
        checked += 1;
    }
    assert!(checked > SAMPLES / 2);
}

#[test]
fn test_singular_matrix_has_no_inverse() {
    let singular = AffineTransform::new(1.0, 2.0, 2.0, 4.0, 0.0, 0.0);
    assert!(singular.inverse().is_err());
}
