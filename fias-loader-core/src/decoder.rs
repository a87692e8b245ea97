//! Streaming XML element decoder.
//!
//! Walks the document as a token stream and materializes only the elements
//! whose local name matches the configured element name. Everything else is
//! skipped with no allocation beyond the reusable event buffer, so memory use
//! stays flat regardless of file size.
//!
//! A matched element may be self-closing (the usual shape of the export) or
//! carry content; in the latter case its content is skipped up to the
//! matching end tag. Only attributes are collected.
//!
//! A document that ends while elements are still open, such as an export
//! cut off between two elements, is a decode error rather than a clean end.
//!
//! The file handle is owned by the stream and released when the stream is
//! dropped, whether exhausted or abandoned after an error.

use crate::error::{FiasLoaderError, Result};
use crate::schema::RawElement;
use futures::Stream;
use quick_xml::errors::IllFormedError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::BufReader;

const READ_BUFFER_CAPACITY: usize = 1024 * 1024;

/// Single-pass stream of elements matching one element name.
pub struct ElementStream {
    reader: Reader<BufReader<File>>,
    path: PathBuf,
    element_name: String,
    buf: Vec<u8>,
    skip_buf: Vec<u8>,
    /// Names of the non-matching elements still open at the cursor.
    open: Vec<String>,
    matched: u64,
    finished: bool,
}

impl std::fmt::Debug for ElementStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementStream")
            .field("path", &self.path)
            .field("element_name", &self.element_name)
            .field("matched", &self.matched)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl ElementStream {
    /// Opens `path` for streaming elements named `element_name`.
    ///
    /// # Errors
    /// Returns [`FiasLoaderError::Io`] if the file cannot be opened.
    pub async fn open(path: impl AsRef<Path>, element_name: impl Into<String>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)
            .await
            .map_err(|e| FiasLoaderError::io(format!("cannot open {}", path.display()), e))?;

        let reader = Reader::from_reader(BufReader::with_capacity(READ_BUFFER_CAPACITY, file));

        Ok(Self {
            reader,
            path,
            element_name: element_name.into(),
            buf: Vec::with_capacity(8192),
            skip_buf: Vec::new(),
            open: Vec::new(),
            matched: 0,
            finished: false,
        })
    }

    /// Path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of elements yielded so far.
    pub const fn matched(&self) -> u64 {
        self.matched
    }

    /// Pulls the next matching element.
    ///
    /// Returns `Ok(None)` at end of document. After the end or an error the
    /// stream stays exhausted.
    ///
    /// # Errors
    /// Returns [`FiasLoaderError::Decode`] on malformed markup and
    /// [`FiasLoaderError::Io`] when the file cannot be read.
    pub async fn next_element(&mut self) -> Result<Option<RawElement>> {
        if self.finished {
            return Ok(None);
        }

        match self.advance().await {
            Ok(Some(element)) => {
                self.matched = self.matched.saturating_add(1);
                Ok(Some(element))
            }
            Ok(None) => {
                self.finished = true;
                Ok(None)
            }
            Err(source) => {
                self.finished = true;
                Err(self.decode_error(source))
            }
        }
    }

    /// Adapts the decoder into a [`Stream`] of elements.
    pub fn into_stream(self) -> impl Stream<Item = Result<RawElement>> + Send {
        futures::stream::try_unfold(self, |mut stream| async move {
            Ok(stream.next_element().await?.map(|element| (element, stream)))
        })
    }

    async fn advance(&mut self) -> std::result::Result<Option<RawElement>, quick_xml::Error> {
        let target = self.element_name.as_bytes();

        loop {
            self.buf.clear();
            match self.reader.read_event_into_async(&mut self.buf).await? {
                Event::Empty(ref start) if start.local_name().as_ref() == target => {
                    return collect_attributes(start).map(Some);
                }
                Event::Start(ref start) if start.local_name().as_ref() == target => {
                    let element = collect_attributes(start)?;
                    let end = start.to_end().into_owned();
                    self.skip_buf.clear();
                    self.reader
                        .read_to_end_into_async(end.name(), &mut self.skip_buf)
                        .await?;
                    return Ok(Some(element));
                }
                Event::Start(ref start) => {
                    self.open
                        .push(String::from_utf8_lossy(start.name().as_ref()).into_owned());
                }
                Event::End(_) => {
                    self.open.pop();
                }
                Event::Eof => {
                    return match self.open.pop() {
                        Some(name) => Err(quick_xml::Error::IllFormed(
                            IllFormedError::MissingEndTag(name),
                        )),
                        None => Ok(None),
                    };
                }
                _ => {}
            }
        }
    }

    fn decode_error(&self, source: quick_xml::Error) -> FiasLoaderError {
        let context = format!(
            "{} at byte {} after {} <{}> elements",
            self.path.display(),
            self.reader.buffer_position(),
            self.matched,
            self.element_name
        );

        match source {
            quick_xml::Error::Io(io) => FiasLoaderError::Io {
                context,
                source: std::io::Error::new(io.kind(), io.to_string()),
            },
            source => FiasLoaderError::Decode { context, source },
        }
    }
}

fn collect_attributes(start: &BytesStart<'_>) -> std::result::Result<RawElement, quick_xml::Error> {
    let mut attributes = HashMap::new();

    for attribute in start.attributes() {
        let attribute = attribute?;
        let key = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
        let value = attribute.unescape_value()?.into_owned();
        attributes.insert(key, value);
    }

    Ok(RawElement::new(attributes))
}
