use glam::DVec3;
use pcdconv_data::{
    AttributeKind, ErrorKind, PointCloud, export_color_pointcloud, export_pointcloud,
    import_color_pointcloud, import_pointcloud, pcd,
};
use rand::Rng;

mod common;

use common::{finite_f64, scratch_dir, seeded_rng};

#[test]
fn intensity_roundtrip_is_bit_exact() {
    let dir = scratch_dir("roundtrip_intensity");
    let mut rng = seeded_rng(0x9E37_79B9_7F4A_7C15);

    for n in [0usize, 1, 2, 7, 64, 1000] {
        let points: Vec<f64> = (0..3 * n).map(|_| finite_f64(&mut rng)).collect();
        let intensities: Vec<i32> = (0..n).map(|_| rng.r#gen::<i32>()).collect();
        let path = dir.join(format!("cloud_{}.pcd", n));

        export_pointcloud(&path, &points, &intensities).unwrap();
        assert_eq!(
            std::fs::metadata(&path).unwrap().len(),
            pcd::expected_file_size(n as u64, AttributeKind::Intensity)
        );

        let (positions, decoded) = import_pointcloud(&path).unwrap();
        assert_eq!(positions.len(), decoded.len());
        assert_eq!(decoded, intensities);
        for (i, (x, y, z)) in positions.iter().enumerate() {
            assert_eq!(x.to_bits(), points[3 * i].to_bits());
            assert_eq!(y.to_bits(), points[3 * i + 1].to_bits());
            assert_eq!(z.to_bits(), points[3 * i + 2].to_bits());
        }
    }

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn color_roundtrip_is_exact() {
    let dir = scratch_dir("roundtrip_color");
    let mut rng = seeded_rng(0xD1B5_4A32_D192_ED03);

    for n in [0usize, 1, 3, 255, 4096] {
        let points: Vec<f64> = (0..3 * n).map(|_| finite_f64(&mut rng)).collect();
        let colors: Vec<u8> = (0..3 * n).map(|_| rng.r#gen::<u8>()).collect();
        let path = dir.join(format!("cloud_{}.pcd", n));

        export_color_pointcloud(&path, &points, &colors).unwrap();
        let (positions, decoded) = import_color_pointcloud(&path).unwrap();
        assert_eq!(positions.len(), n);
        assert_eq!(decoded.len(), n);

        let flat: Vec<u8> = decoded.iter().flat_map(|&(r, g, b)| [r, g, b]).collect();
        assert_eq!(flat, colors);
        let flat: Vec<u64> = positions
            .iter()
            .flat_map(|&(x, y, z)| [x.to_bits(), y.to_bits(), z.to_bits()])
            .collect();
        let expected: Vec<u64> = points.iter().map(|v| v.to_bits()).collect();
        assert_eq!(flat, expected);
    }

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn every_truncation_is_rejected() {
    let cloud = PointCloud::with_intensities(
        vec![DVec3::new(1.0, 2.0, 3.0), DVec3::new(4.0, 5.0, 6.0)],
        vec![10, 20],
    )
    .unwrap();
    let bytes = pcd::encode_to_vec(&cloud).unwrap();

    for len in 0..bytes.len() {
        let err = pcd::decode_from_slice(&bytes[..len], AttributeKind::Intensity).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format, "prefix of {} bytes", len);
    }
    assert_eq!(
        pcd::decode_from_slice(&bytes, AttributeKind::Intensity).unwrap(),
        cloud
    );
}
