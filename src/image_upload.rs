// Image Uploads
// Background decoding of files handed over by the file input. Reading a file
// into a data URL is the only step of the editor off the caller's thread.
// Completions come back in submission order.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Cursor;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::JoinHandle;

use base64::Engine;

/// A file handed over by the file input
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFile {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ImageFile {
    pub fn new(bytes: impl Into<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Whether the MIME type is acceptable for an `image/*` file input
    pub fn is_image(&self) -> bool {
        self.mime_type
            .split_once('/')
            .is_some_and(|(top, sub)| {
                top.trim().eq_ignore_ascii_case("image") && !sub.trim().is_empty()
            })
    }
}

/// Result of reading one file
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub ticket: u64,
    /// `data:<mime>;base64,<payload>`
    pub data_url: String,
    pub mime_type: String,
    pub intrinsic_size: Option<(u32, u32)>,
}

struct Job {
    ticket: u64,
    file: ImageFile,
}

/// Encode the file as a data URL and probe its pixel size.
pub fn decode(ticket: u64, file: &ImageFile) -> DecodedImage {
    let payload = base64::engine::general_purpose::STANDARD.encode(&file.bytes);
    let data_url = format!("data:{};base64,{}", file.mime_type, payload);

    DecodedImage {
        ticket,
        data_url,
        mime_type: file.mime_type.clone(),
        intrinsic_size: probe_dimensions(&file.bytes),
    }
}

fn probe_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    let reader = match image::ImageReader::new(Cursor::new(bytes)).with_guessed_format() {
        Ok(reader) => reader,
        Err(err) => {
            tracing::warn!("could not inspect uploaded image: {err}");
            return None;
        }
    };
    match reader.into_dimensions() {
        Ok(size) => Some(size),
        Err(err) => {
            tracing::warn!("uploaded image is not decodable, inserting as-is: {err}");
            None
        }
    }
}

/// Queue of uploads being decoded off the editor's thread.
/// Completions are handed out strictly in ticket order.
#[derive(Default)]
pub struct ImageUploads {
    jobs: Option<Sender<Job>>,
    results: Option<Receiver<DecodedImage>>,
    worker: Option<JoinHandle<()>>,
    /// Tickets handed to the worker and not yet received back
    in_flight: BTreeSet<u64>,
    /// Completions waiting for every earlier ticket to land
    done: BTreeMap<u64, DecodedImage>,
    next_ticket: u64,
}

impl ImageUploads {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_worker(&mut self) {
        if self.jobs.is_some() {
            return;
        }

        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let (result_tx, result_rx) = mpsc::channel();

        let spawned = std::thread::Builder::new()
            .name("image-decode".to_string())
            .spawn(move || {
                for job in job_rx {
                    let decoded = decode(job.ticket, &job.file);
                    if result_tx.send(decoded).is_err() {
                        break;
                    }
                }
            });

        match spawned {
            Ok(handle) => {
                self.jobs = Some(job_tx);
                self.results = Some(result_rx);
                self.worker = Some(handle);
            }
            Err(err) => {
                tracing::warn!("failed to start image decoder thread, decoding inline: {err}");
            }
        }
    }

    /// Queue a file for decoding. Returns its ticket.
    pub fn submit(&mut self, file: ImageFile) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;

        self.ensure_worker();
        let job = Job { ticket, file };
        let job = match &self.jobs {
            Some(tx) => match tx.send(job) {
                Ok(()) => {
                    self.in_flight.insert(ticket);
                    tracing::debug!(ticket, "queued image for decoding");
                    return ticket;
                }
                Err(mpsc::SendError(job)) => job,
            },
            None => job,
        };

        // Still released after any earlier ticket the worker owes us
        self.done.insert(ticket, decode(job.ticket, &job.file));
        ticket
    }

    /// Number of uploads not yet handed back
    pub fn pending(&self) -> usize {
        self.in_flight.len() + self.done.len()
    }

    fn accept(&mut self, decoded: DecodedImage) {
        self.in_flight.remove(&decoded.ticket);
        self.done.insert(decoded.ticket, decoded);
    }

    /// The lowest finished ticket, unless an earlier one is still in flight
    fn release(&mut self) -> Option<DecodedImage> {
        let (&ticket, _) = self.done.first_key_value()?;
        if self.in_flight.first().is_some_and(|&owed| owed < ticket) {
            return None;
        }
        self.done.remove(&ticket)
    }

    fn worker_lost(&mut self) {
        tracing::warn!(lost = self.in_flight.len(), "image decoder stopped unexpectedly");
        self.in_flight.clear();
        self.jobs.take();
        self.results.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }

    /// Move everything the worker has already finished into `done`
    fn collect_finished(&mut self) {
        while !self.in_flight.is_empty() {
            let received = match &self.results {
                Some(results) => results.try_recv(),
                None => Err(TryRecvError::Disconnected),
            };
            match received {
                Ok(decoded) => self.accept(decoded),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => self.worker_lost(),
            }
        }
    }

    /// Next completed upload, without blocking
    pub fn try_next(&mut self) -> Option<DecodedImage> {
        self.collect_finished();
        self.release()
    }

    /// Next completed upload, blocking until it lands.
    /// Returns `None` once nothing is pending.
    pub fn wait_next(&mut self) -> Option<DecodedImage> {
        loop {
            self.collect_finished();
            if let Some(decoded) = self.release() {
                return Some(decoded);
            }
            if self.in_flight.is_empty() {
                return None;
            }
            let received = self.results.as_ref().and_then(|results| results.recv().ok());
            match received {
                Some(decoded) => self.accept(decoded),
                None => self.worker_lost(),
            }
        }
    }
}

impl Drop for ImageUploads {
    fn drop(&mut self) {
        // Closing the job channel ends the worker loop
        self.jobs.take();
        self.results.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
