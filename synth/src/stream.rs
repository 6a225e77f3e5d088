use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::request::SynthesisOutput;

/// Encoded chunks of one streaming synthesis run, in engine emission order.
///
/// The sequence ends after the last chunk or right after an error item.
/// Dropping the stream stops the producer at its next chunk and releases
/// the engine.
#[derive(Debug)]
pub struct SynthesisStream {
    rx: mpsc::Receiver<Result<SynthesisOutput>>,
}

impl SynthesisStream {
    pub(crate) fn new(rx: mpsc::Receiver<Result<SynthesisOutput>>) -> Self {
        Self { rx }
    }
}

impl Stream for SynthesisStream {
    type Item = Result<SynthesisOutput>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
