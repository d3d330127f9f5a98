//! Failure classification integration tests.

use mediaflow_core::{ConversionError, ErrorSignature, FailureKind, SignatureTable};

const ARGUMENTS: &str = "-hwaccel xyz -i \"/media/in.mp4\" \"/media/out.mp4\"";

#[test]
fn test_unrecognized_hwaccel() {
    let log = "ffmpeg version 6.0\nUnrecognized hwaccel: xyz.\nSupported hwaccels: cuda vaapi";
    let err = SignatureTable::default().check(log, ARGUMENTS).unwrap_err();

    match &err {
        ConversionError::HardwareAcceleratorNotFound { log: message, arguments } => {
            assert_eq!(message, log);
            assert_eq!(arguments, ARGUMENTS);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(err.to_string(), log);
}

#[test]
fn test_no_suitable_output_format() {
    let log = "[NULL @ 0x55d5] Unable to find a suitable output format for 'out.xyz'\nout.xyz: Invalid argument";
    let err = SignatureTable::default().check(log, ARGUMENTS).unwrap_err();
    assert_eq!(err.kind(), Some(FailureKind::NoSuitableOutputFormat));
    assert_eq!(err.arguments(), Some(ARGUMENTS));
}

#[test]
fn test_bitstream_filter_mismatch() {
    let log = "Codec 'aac' (86018) is not supported by the bitstream filter 'h264_mp4toannexb'";
    assert_eq!(
        SignatureTable::default().classify(log),
        Some(FailureKind::InvalidBitstreamFilter)
    );
}

#[test]
fn test_decoder_markers() {
    let table = SignatureTable::default();
    assert_eq!(
        table.classify("[avi @ 0x1] multiple fourcc not supported"),
        Some(FailureKind::UnknownDecoder)
    );
    assert_eq!(
        table.classify("Failed to open codec in avformat_find_stream_info"),
        Some(FailureKind::UnknownDecoder)
    );
}

#[test]
fn test_warnings_need_empty_output() {
    let table = SignatureTable::default();
    let warning = "[asf @ 0x1] asf_read_pts failed";
    assert_eq!(table.classify(warning), None);
    assert!(table.check(warning, ARGUMENTS).is_ok());

    let fatal = format!("{}\nOutput file is empty, nothing was encoded", warning);
    assert_eq!(table.classify(&fatal), Some(FailureKind::UnknownDecoder));
}

#[test]
fn test_clean_log_passes() {
    let log = "frame=  250 fps=0.0 q=-1.0 Lsize=    1024kB time=00:00:10.00 bitrate= 838.9kbits/s";
    assert!(SignatureTable::default().check(log, ARGUMENTS).is_ok());
}

#[test]
fn test_extended_table() {
    let mut table = SignatureTable::default();
    table.push(ErrorSignature::new(
        "Conversion failed!",
        false,
        FailureKind::Generic,
    ));

    let err = table.check("Conversion failed!", ARGUMENTS).unwrap_err();
    assert!(matches!(err, ConversionError::Failed { .. }));
    assert_eq!(table.len(), SignatureTable::default().len() + 1);
}
