//! Stream decoding for form XObject content.

use std::io::Read;

use bytes::Bytes;
use flate2::read::ZlibDecoder;
use flate2::{Decompress, FlushDecompress, Status};
use tracing::warn;

use crate::error::{PdfError, Result};
use crate::model::objects::{Object, Stream};

/// Turns a stream's raw bytes into its decoded content.
pub trait StreamDecoder {
    fn decode(&self, stream: &Stream) -> Result<Bytes>;
}

/// Handles unfiltered streams and `FlateDecode` (`Fl`) chains without
/// predictors.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardDecoder;

impl StreamDecoder for StandardDecoder {
    fn decode(&self, stream: &Stream) -> Result<Bytes> {
        let filters = stream.filters();
        if filters.is_empty() {
            return Ok(stream.data.clone());
        }
        if let Some(predictor) = predictor(stream)
            && predictor > 1
        {
            return Err(PdfError::Decode(format!("predictor {predictor} is not supported")));
        }
        let mut data = stream.data.to_vec();
        for filter in &filters {
            data = match filter.as_str() {
                "FlateDecode" | "Fl" => flate_decode(&data)?,
                other => return Err(PdfError::Decode(format!("unsupported filter /{other}"))),
            };
        }
        Ok(Bytes::from(data))
    }
}

fn predictor(stream: &Stream) -> Option<i64> {
    let parms = match stream.get("DecodeParms")? {
        Object::Array(items) => items.iter().find_map(|p| p.as_dict().ok())?,
        other => other.as_dict().ok()?,
    };
    parms.get("Predictor")?.as_int().ok()
}

/// Inflates zlib data. A stream that breaks off part-way yields what could
/// be recovered, with a warning.
pub fn flate_decode(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    match ZlibDecoder::new(data).read_to_end(&mut out) {
        Ok(_) => Ok(out),
        Err(err) => {
            let partial = inflate_partial(data);
            if partial.is_empty() {
                Err(PdfError::Decode(format!("FlateDecode error: {err}")))
            } else {
                warn!(%err, recovered = partial.len(), "corrupt FlateDecode stream, using partial output");
                Ok(partial)
            }
        }
    }
}

/// Feeds the decoder byte by byte and keeps everything produced before the
/// first error.
fn inflate_partial(data: &[u8]) -> Vec<u8> {
    let mut decoder = Decompress::new(true);
    let mut out = Vec::with_capacity(data.len() * 2);
    let mut buf = [0u8; 4096];
    let mut i = 0usize;
    while i < data.len() {
        let before_out = decoder.total_out();
        let before_in = decoder.total_in();
        let res = decoder.decompress(&data[i..i + 1], &mut buf, FlushDecompress::None);
        let produced = (decoder.total_out() - before_out) as usize;
        out.extend_from_slice(&buf[..produced]);
        let consumed = (decoder.total_in() - before_in) as usize;
        i += consumed.max(1);
        match res {
            Ok(Status::StreamEnd) | Err(_) => break,
            Ok(_) => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::Compression;
    use flate2::write::ZlibEncoder;

    use super::*;
    use crate::model::objects::dict;

    fn deflate(data: &[u8]) -> Vec<u8> {
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn unfiltered_passes_through() {
        let s = Stream::new(dict([]), b"0 0 m".to_vec());
        assert_eq!(StandardDecoder.decode(&s).unwrap(), Bytes::from_static(b"0 0 m"));
    }

    #[test]
    fn flate_round_trips() {
        let s = Stream::new(
            dict([("Filter", Object::name("FlateDecode"))]),
            deflate(b"BT /F1 12 Tf (Hi) Tj ET"),
        );
        assert_eq!(
            StandardDecoder.decode(&s).unwrap(),
            Bytes::from_static(b"BT /F1 12 Tf (Hi) Tj ET")
        );
    }

    #[test]
    fn other_filters_are_decode_errors() {
        let s = Stream::new(dict([("Filter", Object::name("DCTDecode"))]), Vec::new());
        assert!(matches!(StandardDecoder.decode(&s), Err(PdfError::Decode(_))));
    }

    #[test]
    fn truncated_flate_keeps_what_it_can() {
        let full = deflate(&b"q 1 0 0 1 0 0 cm Q ".repeat(200));
        let cut = &full[..full.len() / 2];
        let out = flate_decode(cut).unwrap();
        assert!(!out.is_empty());
        assert!(out.starts_with(b"q 1 0 0 1 0 0 cm Q"));
    }
}
