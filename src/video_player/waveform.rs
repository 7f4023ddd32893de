// SPDX-License-Identifier: MPL-2.0
//! Optional waveform add-on.
//!
//! The preview core only knows the [`WaveformAddon`] capability. The add-on
//! is attached once per loaded resource and always receives the media
//! element explicitly. [`PeakWaveform`] decodes the audio track to a mono
//! peak envelope in the background and reports playback progress from the
//! element it is given.

use super::element::MediaElement;
use crate::error::VideoError;
use crate::media::{video, MediaResource, ResourceId};
use std::path::PathBuf;
use std::sync::Arc;

/// Mono rate used for analysis; plenty for a visual envelope.
const ANALYSIS_SAMPLE_RATE: u32 = 8_000;

/// Amplitude statistics of one bin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PeakBin {
    pub min: f32,
    pub max: f32,
    pub rms: f32,
}

/// Peak envelope of a whole audio track.
#[derive(Debug, Clone, PartialEq)]
pub struct Peaks {
    pub bins: Arc<Vec<PeakBin>>,
    pub duration_secs: f64,
}

/// Background job description returned by [`WaveformAddon::attach`].
#[derive(Debug, Clone, PartialEq)]
pub struct PeakRequest {
    pub resource: ResourceId,
    pub path: PathBuf,
    pub bins: usize,
}

/// What the add-on can show right now.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WaveformSnapshot<'a> {
    Detached,
    NoAudio,
    Loading,
    Ready {
        peaks: &'a Peaks,
        /// Playhead position in `0.0..=1.0`.
        progress: f32,
    },
    Failed,
}

/// Waveform capability of the preview.
pub trait WaveformAddon {
    /// Binds the add-on to `resource`. Repeated calls for the same resource
    /// are ignored. Returns the peak job to run, if any.
    fn attach(&mut self, resource: &MediaResource, element: &dyn MediaElement)
        -> Option<PeakRequest>;

    /// Delivers a finished job. Results for another resource are dropped.
    fn on_peaks(&mut self, resource: ResourceId, result: Result<Peaks, VideoError>);

    fn detach(&mut self);

    fn snapshot(&self, element: &dyn MediaElement) -> WaveformSnapshot<'_>;
}

#[derive(Debug, Clone, PartialEq, Default)]
enum Status {
    #[default]
    Detached,
    NoAudio,
    Loading,
    Ready(Peaks),
    Failed,
}

/// Peak-envelope implementation of [`WaveformAddon`].
#[derive(Debug, Default)]
pub struct PeakWaveform {
    bins: usize,
    attached: Option<ResourceId>,
    status: Status,
}

impl PeakWaveform {
    #[must_use]
    pub fn new(bins: usize) -> Self {
        Self {
            bins: bins.max(1),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn attached(&self) -> Option<ResourceId> {
        self.attached
    }
}

impl WaveformAddon for PeakWaveform {
    fn attach(
        &mut self,
        resource: &MediaResource,
        element: &dyn MediaElement,
    ) -> Option<PeakRequest> {
        if self.attached == Some(resource.id()) {
            return None;
        }
        self.attached = Some(resource.id());

        if !element.has_audio() {
            self.status = Status::NoAudio;
            return None;
        }

        self.status = Status::Loading;
        Some(PeakRequest {
            resource: resource.id(),
            path: resource.path().to_path_buf(),
            bins: self.bins,
        })
    }

    fn on_peaks(&mut self, resource: ResourceId, result: Result<Peaks, VideoError>) {
        if self.attached != Some(resource) {
            tracing::debug!(%resource, "dropping peaks for stale resource");
            return;
        }
        self.status = match result {
            Ok(peaks) => Status::Ready(peaks),
            Err(e) => {
                tracing::warn!(%resource, error = %e, "waveform extraction failed");
                Status::Failed
            }
        };
    }

    fn detach(&mut self) {
        self.attached = None;
        self.status = Status::Detached;
    }

    fn snapshot(&self, element: &dyn MediaElement) -> WaveformSnapshot<'_> {
        match &self.status {
            Status::Detached => WaveformSnapshot::Detached,
            Status::NoAudio => WaveformSnapshot::NoAudio,
            Status::Loading => WaveformSnapshot::Loading,
            Status::Failed => WaveformSnapshot::Failed,
            Status::Ready(peaks) => {
                let duration = if element.duration() > 0.0 {
                    element.duration()
                } else {
                    peaks.duration_secs
                };
                let progress = if duration > 0.0 {
                    (element.current_time() / duration).clamp(0.0, 1.0) as f32
                } else {
                    0.0
                };
                WaveformSnapshot::Ready { peaks, progress }
            }
        }
    }
}

/// Running min/max/energy of a run of samples.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Bucket {
    min: f32,
    max: f32,
    sum_sq: f64,
    count: u64,
}

impl Bucket {
    const EMPTY: Self = Self {
        min: f32::INFINITY,
        max: f32::NEG_INFINITY,
        sum_sq: 0.0,
        count: 0,
    };

    fn push(&mut self, sample: f32) {
        self.min = self.min.min(sample);
        self.max = self.max.max(sample);
        self.sum_sq += f64::from(sample) * f64::from(sample);
        self.count += 1;
    }

    fn merge(&mut self, other: &Self) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.sum_sq += other.sum_sq;
        self.count += other.count;
    }

    fn to_bin(self) -> PeakBin {
        if self.count == 0 {
            return PeakBin::default();
        }
        PeakBin {
            min: self.min,
            max: self.max,
            rms: (self.sum_sq / self.count as f64).sqrt() as f32,
        }
    }
}

/// Folds a sample stream of unknown length into a fixed number of bins.
///
/// Keeps between `bins` and `2 * bins` equal buckets: once they are all
/// full, neighbours are merged and each bucket spans twice as many
/// samples. Memory stays proportional to `bins` whatever the track length.
#[derive(Debug, Clone)]
pub struct PeakAccumulator {
    bins: usize,
    buckets: Vec<Bucket>,
    span: u64,
    current: Bucket,
    samples: u64,
}

impl PeakAccumulator {
    #[must_use]
    pub fn new(bins: usize) -> Self {
        let bins = bins.max(1);
        Self {
            bins,
            buckets: Vec::with_capacity(bins * 2),
            span: 1,
            current: Bucket::EMPTY,
            samples: 0,
        }
    }

    pub fn push(&mut self, sample: f32) {
        self.current.push(sample);
        self.samples += 1;
        if self.current.count == self.span {
            self.buckets.push(std::mem::replace(&mut self.current, Bucket::EMPTY));
            if self.buckets.len() == self.bins * 2 {
                self.compact();
            }
        }
    }

    pub fn extend(&mut self, samples: &[f32]) {
        for &sample in samples {
            self.push(sample);
        }
    }

    /// Samples seen so far.
    #[must_use]
    pub fn sample_count(&self) -> u64 {
        self.samples
    }

    fn compact(&mut self) {
        self.buckets = self
            .buckets
            .chunks(2)
            .map(|pair| {
                let mut merged = pair[0];
                if let Some(second) = pair.get(1) {
                    merged.merge(second);
                }
                merged
            })
            .collect();
        self.span *= 2;
    }

    /// Spreads the buckets evenly over `bins` bins.
    ///
    /// Each bin covers the same share of the track, so the envelope spans
    /// the full width. Tracks shorter than `bins` samples are stretched.
    #[must_use]
    pub fn finish(mut self) -> Vec<PeakBin> {
        if self.current.count > 0 {
            self.buckets.push(self.current);
        }
        let filled = self.buckets.len();
        if filled == 0 {
            return vec![PeakBin::default(); self.bins];
        }

        (0..self.bins)
            .map(|i| {
                let start = i * filled / self.bins;
                let end = ((i + 1) * filled / self.bins).max(start + 1);
                self.buckets[start..end]
                    .iter()
                    .fold(Bucket::EMPTY, |mut acc, bucket| {
                        acc.merge(bucket);
                        acc
                    })
                    .to_bin()
            })
            .collect()
    }
}

/// Buckets mono samples into `bins` min/max/rms bins of equal duration.
#[must_use]
pub fn bucket_peaks(samples: &[f32], bins: usize) -> Vec<PeakBin> {
    let mut accumulator = PeakAccumulator::new(bins);
    accumulator.extend(samples);
    accumulator.finish()
}

/// Decodes the audio track of `request.path` into a peak envelope.
///
/// Blocking; run it off the UI thread. Samples are folded into the bins as
/// they are decoded.
///
/// # Errors
///
/// Returns an error if the file has no audio track or cannot be decoded.
pub fn compute_peaks(request: &PeakRequest) -> Result<Peaks, VideoError> {
    let classify = |e: crate::error::Error| VideoError::from_message(&e.to_string());
    video::init_ffmpeg().map_err(classify)?;

    let mut ictx = ffmpeg_next::format::input(&request.path)
        .map_err(|e| VideoError::from_message(&e.to_string()))?;
    let input = ictx
        .streams()
        .best(ffmpeg_next::media::Type::Audio)
        .ok_or_else(|| VideoError::Other("No audio stream found".to_string()))?;
    let audio_stream_index = input.index();

    let context_decoder = ffmpeg_next::codec::context::Context::from_parameters(input.parameters())
        .map_err(|e| VideoError::DecodingFailed(e.to_string()))?;
    let mut decoder = context_decoder
        .decoder()
        .audio()
        .map_err(|e| VideoError::DecodingFailed(e.to_string()))?;

    let mut resampler = ffmpeg_next::software::resampling::Context::get(
        decoder.format(),
        decoder.channel_layout(),
        decoder.rate(),
        ffmpeg_next::format::Sample::F32(ffmpeg_next::format::sample::Type::Packed),
        ffmpeg_next::ChannelLayout::MONO,
        ANALYSIS_SAMPLE_RATE,
    )
    .map_err(|e| VideoError::DecodingFailed(format!("Failed to create resampler: {e}")))?;

    let mut accumulator = PeakAccumulator::new(request.bins);
    let mut feed = video::PacketFeed::new(audio_stream_index);
    let mut decoded_frame = ffmpeg_next::frame::Audio::empty();
    let mut resampled_frame = ffmpeg_next::frame::Audio::empty();

    loop {
        match feed.next_frame(&mut ictx, &mut decoder, &mut decoded_frame) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                // Skip undecodable packets, the envelope just has a gap
                tracing::debug!(error = %e, "audio packet skipped");
                continue;
            }
        }
        if resampler.run(&decoded_frame, &mut resampled_frame).is_ok() {
            accumulator.extend(&super::audio::extract_samples(&resampled_frame, 1));
        }
    }
    // Samples still held by the resampler
    let mut tail = ffmpeg_next::frame::Audio::empty();
    if resampler.flush(&mut tail).is_ok() && tail.samples() > 0 {
        accumulator.extend(&super::audio::extract_samples(&tail, 1));
    }

    if accumulator.sample_count() == 0 {
        return Err(VideoError::DecodingFailed(
            "No audio samples decoded".to_string(),
        ));
    }

    let duration_secs = accumulator.sample_count() as f64 / f64::from(ANALYSIS_SAMPLE_RATE);
    tracing::debug!(
        resource = %request.resource,
        samples = accumulator.sample_count(),
        bins = request.bins,
        "peaks computed"
    );

    Ok(Peaks {
        bins: Arc::new(accumulator.finish()),
        duration_secs,
    })
}

/// Runs [`compute_peaks`] on the blocking pool.
pub async fn load_peaks(request: PeakRequest) -> (ResourceId, Result<Peaks, VideoError>) {
    let resource = request.resource;
    let result = tokio::task::spawn_blocking(move || compute_peaks(&request))
        .await
        .unwrap_or_else(|e| Err(VideoError::Other(format!("Waveform task failed: {e}"))));
    (resource, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::ResourceRegistry;
    use crate::test_utils::{assert_abs_diff_eq, F32_EPSILON};
    use crate::video_player::{DecodedFrame, ReadyState};
    use std::path::Path;

    struct Clock {
        time: f64,
        duration: f64,
        audio: bool,
    }

    impl MediaElement for Clock {
        fn load(&mut self, _resource: &MediaResource) {}
        fn play(&mut self) {}
        fn pause(&mut self) {}
        fn ready_state(&self) -> ReadyState {
            ReadyState::HaveEnoughData
        }
        fn is_paused(&self) -> bool {
            true
        }
        fn current_time(&self) -> f64 {
            self.time
        }
        fn duration(&self) -> f64 {
            self.duration
        }
        fn has_audio(&self) -> bool {
            self.audio
        }
        fn current_frame(&self) -> Option<&DecodedFrame> {
            None
        }
    }

    fn peaks() -> Peaks {
        Peaks {
            bins: Arc::new(vec![PeakBin::default(); 4]),
            duration_secs: 10.0,
        }
    }

    #[test]
    fn bucket_peaks_computes_min_max_rms() {
        let samples = [0.5, -0.5, 1.0, -1.0];
        let bins = bucket_peaks(&samples, 2);

        assert_eq!(bins.len(), 2);
        assert_abs_diff_eq!(bins[0].min, -0.5, epsilon = F32_EPSILON);
        assert_abs_diff_eq!(bins[0].max, 0.5, epsilon = F32_EPSILON);
        assert_abs_diff_eq!(bins[0].rms, 0.5, epsilon = F32_EPSILON);
        assert_abs_diff_eq!(bins[1].rms, 1.0, epsilon = F32_EPSILON);
    }

    #[test]
    fn bucket_peaks_stretches_short_input() {
        let bins = bucket_peaks(&[0.25], 8);
        assert_eq!(bins.len(), 8);
        assert!(bins.iter().all(|bin| bin.max == 0.25));
    }

    #[test]
    fn loud_track_fills_every_bin_whatever_its_length() {
        for len in [481, 1000, 24_000, 100_003] {
            let samples = vec![1.0_f32; len];
            let bins = bucket_peaks(&samples, 480);

            assert_eq!(bins.len(), 480);
            let silent = bins.iter().filter(|bin| bin.rms == 0.0).count();
            assert_eq!(silent, 0, "{len} samples left silent bins");
        }
    }

    #[test]
    fn envelope_follows_position_in_the_track() {
        // Loud first half, silent second half, length not a multiple of bins
        let mut samples = vec![0.8_f32; 5_003];
        samples.resize(10_006, 0.0);
        let bins = bucket_peaks(&samples, 10);

        assert!(bins[..4].iter().all(|bin| bin.max > 0.7));
        assert!(bins[6..].iter().all(|bin| bin.max == 0.0));
    }

    #[test]
    fn accumulator_memory_is_bounded() {
        let mut accumulator = PeakAccumulator::new(16);
        for i in 0..1_000_000 {
            accumulator.push(if i % 2 == 0 { 0.5 } else { -0.5 });
            assert!(accumulator.buckets.len() < 32);
        }
        assert_eq!(accumulator.sample_count(), 1_000_000);

        let bins = accumulator.finish();
        assert_eq!(bins.len(), 16);
        for bin in bins {
            assert_abs_diff_eq!(bin.min, -0.5, epsilon = F32_EPSILON);
            assert_abs_diff_eq!(bin.max, 0.5, epsilon = F32_EPSILON);
            assert_abs_diff_eq!(bin.rms, 0.5, epsilon = F32_EPSILON);
        }
    }

    #[test]
    fn bucket_peaks_handles_empty_input() {
        assert_eq!(bucket_peaks(&[], 3), vec![PeakBin::default(); 3]);
    }

    #[test]
    fn attach_once_per_resource() {
        let mut registry = ResourceRegistry::new();
        let resource = registry.create(Path::new("song.mp4"));
        let element = Clock {
            time: 0.0,
            duration: 10.0,
            audio: true,
        };
        let mut addon = PeakWaveform::new(64);

        let request = addon.attach(&resource, &element).expect("first attach");
        assert_eq!(request.bins, 64);
        assert_eq!(request.resource, resource.id());
        assert!(addon.attach(&resource, &element).is_none());
        assert_eq!(addon.snapshot(&element), WaveformSnapshot::Loading);
    }

    #[test]
    fn attach_without_audio_requests_nothing() {
        let mut registry = ResourceRegistry::new();
        let resource = registry.create(Path::new("silent.mp4"));
        let element = Clock {
            time: 0.0,
            duration: 10.0,
            audio: false,
        };
        let mut addon = PeakWaveform::new(64);

        assert!(addon.attach(&resource, &element).is_none());
        assert_eq!(addon.snapshot(&element), WaveformSnapshot::NoAudio);
    }

    #[test]
    fn stale_peaks_are_dropped() {
        let mut registry = ResourceRegistry::new();
        let first = registry.create(Path::new("a.mp4"));
        let second = registry.create(Path::new("b.mp4"));
        let element = Clock {
            time: 0.0,
            duration: 10.0,
            audio: true,
        };
        let mut addon = PeakWaveform::new(4);
        addon.attach(&first, &element);
        addon.attach(&second, &element);

        addon.on_peaks(first.id(), Ok(peaks()));

        assert_eq!(addon.snapshot(&element), WaveformSnapshot::Loading);
    }

    #[test]
    fn progress_follows_element_clock() {
        let mut registry = ResourceRegistry::new();
        let resource = registry.create(Path::new("a.mp4"));
        let element = Clock {
            time: 2.5,
            duration: 10.0,
            audio: true,
        };
        let mut addon = PeakWaveform::new(4);
        addon.attach(&resource, &element);
        addon.on_peaks(resource.id(), Ok(peaks()));

        match addon.snapshot(&element) {
            WaveformSnapshot::Ready { progress, .. } => {
                assert_abs_diff_eq!(progress, 0.25, epsilon = F32_EPSILON);
            }
            other => panic!("expected ready snapshot, got {other:?}"),
        }
    }

    #[test]
    fn failed_extraction_is_reported() {
        let mut registry = ResourceRegistry::new();
        let resource = registry.create(Path::new("a.mp4"));
        let element = Clock {
            time: 0.0,
            duration: 1.0,
            audio: true,
        };
        let mut addon = PeakWaveform::new(4);
        addon.attach(&resource, &element);
        addon.on_peaks(resource.id(), Err(VideoError::CorruptedFile));

        assert_eq!(addon.snapshot(&element), WaveformSnapshot::Failed);
        addon.detach();
        assert_eq!(addon.snapshot(&element), WaveformSnapshot::Detached);
    }

    #[tokio::test]
    async fn load_peaks_reports_missing_file() {
        let request = PeakRequest {
            resource: ResourceRegistry::new().create(Path::new("x.mp4")).id(),
            path: PathBuf::from("/nonexistent/x.mp4"),
            bins: 16,
        };
        let (_, result) = load_peaks(request).await;
        assert!(result.is_err());
    }
}
