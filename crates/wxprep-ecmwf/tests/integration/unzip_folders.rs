//! Folder-level unzip behaviour.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use wxprep_ecmwf::{UNZIPPED_MARKER, unzip_all};

fn write_zip(path: &Path, members: &[&str]) {
    let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
    for name in members {
        zip.start_file(*name, zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"netcdf bytes").unwrap();
    }
    zip.finish().unwrap();
}

#[test]
fn test_unzip_marks_and_skips_on_rerun() {
    let root = tempfile::tempdir().unwrap();
    let jan = root.path().join("2020/01");
    let feb = root.path().join("2020/02");
    fs::create_dir_all(&jan).unwrap();
    fs::create_dir_all(&feb).unwrap();
    write_zip(
        &jan.join("era5_single_levels.nc"),
        &["data_stream-oper_stepType-accum.nc", "data_stream-oper_stepType-instant.nc"],
    );
    fs::write(jan.join("pressure_levels.nc"), b"plain").unwrap();

    let report = unzip_all(root.path(), true).unwrap();
    assert_eq!(report.folders_scanned, 2);
    assert_eq!(report.folders_marked, 2);
    assert_eq!(report.archives_extracted, 1);
    assert!(jan.join("data_stream-oper_stepType-accum.nc").exists());
    assert!(!jan.join("era5_single_levels.nc").exists());
    assert!(jan.join(UNZIPPED_MARKER).exists());
    // February had no single-level file but is still marked
    assert!(feb.join(UNZIPPED_MARKER).exists());

    let rerun = unzip_all(root.path(), true).unwrap();
    assert_eq!(rerun.folders_skipped, 2);
    assert_eq!(rerun.folders_marked, 0);
}

#[test]
fn test_corrupt_single_file_still_marks_folder() {
    let root = tempfile::tempdir().unwrap();
    let month = root.path().join("2019/12");
    fs::create_dir_all(&month).unwrap();
    fs::write(month.join("SINGLE.nc"), b"PK\x03\x04truncated").unwrap();

    let report = unzip_all(root.path(), true).unwrap();
    assert_eq!(report.archives_extracted, 0);
    assert!(report.failed.is_empty());
    assert!(month.join(UNZIPPED_MARKER).exists());
    assert!(month.join("SINGLE.nc").exists());
}

#[test]
fn test_failed_extraction_leaves_folder_unmarked() {
    let root = tempfile::tempdir().unwrap();
    let month = root.path().join("2021/03");
    let other = root.path().join("2021/04");
    fs::create_dir_all(&month).unwrap();
    fs::create_dir_all(&other).unwrap();
    // A directory already sits where the archive member must be written
    fs::create_dir(month.join("stepType-accum.nc")).unwrap();
    write_zip(&month.join("era5_single.nc"), &["stepType-accum.nc"]);

    let report = unzip_all(root.path(), true).unwrap();
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, month);
    assert!(!month.join(UNZIPPED_MARKER).exists());
    assert!(month.join("era5_single.nc").exists());
    assert_eq!(report.folders_marked, 1);
    assert!(other.join(UNZIPPED_MARKER).exists());
}

#[test]
fn test_unwritable_marker_is_reported_per_folder() {
    let root = tempfile::tempdir().unwrap();
    let month = root.path().join("2021/05");
    let other = root.path().join("2021/06");
    fs::create_dir_all(&month).unwrap();
    fs::create_dir_all(&other).unwrap();
    // The archive unpacks a directory over the marker path
    let mut zip = zip::ZipWriter::new(File::create(month.join("era5_single.nc")).unwrap());
    zip.add_directory(
        format!("{UNZIPPED_MARKER}/"),
        zip::write::SimpleFileOptions::default(),
    )
    .unwrap();
    zip.start_file("stepType-instant.nc", zip::write::SimpleFileOptions::default())
        .unwrap();
    zip.write_all(b"netcdf bytes").unwrap();
    zip.finish().unwrap();

    let report = unzip_all(root.path(), true).unwrap();
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, month);
    assert!(report.failed[0].1.contains(UNZIPPED_MARKER));
    assert!(other.join(UNZIPPED_MARKER).is_file());
}
