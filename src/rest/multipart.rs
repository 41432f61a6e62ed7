/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::rest::progress::ProgressReader;
use crate::rest::{FlickrError, ParamValue, ProgressObserver};
use bytes::Bytes;
use std::collections::{BTreeMap, VecDeque};
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::PathBuf;
use std::sync::Arc;

const LINE_END: &str = "\r\n";
const TWO_HYPHENS: &str = "--";

/// Binary payload of a file parameter
#[derive(Debug, Clone)]
pub enum Upload {
    /// Streamed from disk when the request is sent
    Path(PathBuf),
    /// Already in memory, `file_name` is what the service sees
    Bytes { file_name: String, data: Bytes },
}

impl Upload {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn from_bytes(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self::Bytes {
            file_name: file_name.into(),
            data: data.into(),
        }
    }

    /// Name reported in progress events
    pub fn label(&self) -> PathBuf {
        match self {
            Self::Path(path) => path.clone(),
            Self::Bytes { file_name, .. } => PathBuf::from(file_name),
        }
    }

    fn file_name(&self) -> String {
        let name = match self {
            Self::Path(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            Self::Bytes { file_name, .. } => file_name.clone(),
        };
        name.replace('"', "%22")
    }

    fn len(&self) -> Result<u64, FlickrError> {
        match self {
            Self::Path(path) => Ok(std::fs::metadata(path)?.len()),
            Self::Bytes { data, .. } => Ok(data.len() as u64),
        }
    }

    fn open(&self) -> Result<Box<dyn Read + Send>, FlickrError> {
        match self {
            Self::Path(path) => Ok(Box::new(File::open(path)?)),
            Self::Bytes { data, .. } => Ok(Box::new(Cursor::new(data.clone()))),
        }
    }
}

/// A multipart/form-data body whose exact length is known before streaming starts
pub(crate) struct MultipartBody {
    pub(crate) boundary: String,
    pub(crate) len: u64,
    pub(crate) reader: MultipartReader,
}

impl MultipartBody {
    pub(crate) fn new(
        params: &BTreeMap<String, ParamValue>,
        observers: &[Arc<dyn ProgressObserver>],
    ) -> Result<Self, FlickrError> {
        let boundary = format!(
            "----------------{:016x}{:016x}",
            rand::random::<u64>(),
            rand::random::<u64>()
        );
        let observers: Arc<[Arc<dyn ProgressObserver>]> = observers.to_vec().into();

        let mut len = 0u64;
        let mut segments: VecDeque<Box<dyn Read + Send>> = VecDeque::new();

        for (name, value) in params {
            let mut part = format!("{TWO_HYPHENS}{boundary}{LINE_END}");
            match value {
                ParamValue::Text(text) => {
                    part.push_str(&format!(
                        "Content-Disposition: form-data; name=\"{name}\"{LINE_END}{LINE_END}{text}{LINE_END}"
                    ));
                    push_text(&mut segments, &mut len, part);
                }
                ParamValue::File(upload) => {
                    part.push_str(&format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{}\"{LINE_END}",
                        upload.file_name()
                    ));
                    part.push_str(&format!(
                        "Content-Type: application/octet-stream{LINE_END}{LINE_END}"
                    ));
                    push_text(&mut segments, &mut len, part);

                    let file_len = upload.len()?;
                    len += file_len;
                    segments.push_back(Box::new(ProgressReader::new(
                        upload.open()?,
                        upload.label(),
                        file_len,
                        observers.clone(),
                    )));
                    push_text(&mut segments, &mut len, LINE_END.to_string());
                }
            }
        }
        push_text(
            &mut segments,
            &mut len,
            format!("{TWO_HYPHENS}{boundary}{TWO_HYPHENS}{LINE_END}"),
        );

        Ok(Self {
            boundary,
            len,
            reader: MultipartReader { segments },
        })
    }

    pub(crate) fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }
}

fn push_text(segments: &mut VecDeque<Box<dyn Read + Send>>, len: &mut u64, text: String) {
    *len += text.len() as u64;
    segments.push_back(Box::new(Cursor::new(text.into_bytes())));
}

// Reads each segment to exhaustion before moving to the next
pub(crate) struct MultipartReader {
    segments: VecDeque<Box<dyn Read + Send>>,
}

impl Read for MultipartReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while let Some(segment) = self.segments.front_mut() {
            let n = segment.read(buf)?;
            if n > 0 {
                return Ok(n);
            }
            self.segments.pop_front();
        }
        Ok(0)
    }
}
