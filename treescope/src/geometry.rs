//! Geometry backends.
//!
//! Some renderers can report a view's layout synchronously; others only
//! through an asynchronous round trip. [`GeometryBackend`] exposes both
//! paths, and the serializer and engine pick whichever the backend supports.

use treescope_common::Measure;

use crate::domain::RequestId;
use crate::host::NativeHandle;
use crate::pending::PendingRequests;

/// Completion handle passed to an asynchronous measurement.
pub struct MeasureCompletion {
    pub id: RequestId,
    requests: PendingRequests<Option<Measure>>,
}

impl MeasureCompletion {
    pub(crate) fn new(id: RequestId, requests: PendingRequests<Option<Measure>>) -> Self {
        Self { id, requests }
    }

    /// Deliver the result. Returns false if the request already timed out.
    pub fn complete(self, measure: Option<Measure>) -> bool {
        self.requests.resolve(self.id, measure)
    }
}

pub trait GeometryBackend {
    /// Layout of a native view, if the backend knows it right now.
    fn measure_sync(&self, handle: &NativeHandle) -> Option<Measure>;

    /// Start an asynchronous measurement. Returns false if unsupported,
    /// in which case `completion` is dropped.
    fn request_measure(&self, handle: &NativeHandle, completion: MeasureCompletion) -> bool {
        let _ = (handle, completion);
        false
    }
}

/// Reads the frame the host attached to each native handle.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameGeometry;

impl GeometryBackend for FrameGeometry {
    fn measure_sync(&self, handle: &NativeHandle) -> Option<Measure> {
        handle.frame
    }
}

/// A backend with no layout information at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeometry;

impl GeometryBackend for NoGeometry {
    fn measure_sync(&self, _handle: &NativeHandle) -> Option<Measure> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_geometry_reads_handle() {
        let frame = Measure { x: 1.0, y: 2.0, width: 30.0, height: 40.0, page_x: 1.0, page_y: 82.0 };
        let handle = NativeHandle { tag: 5, frame: Some(frame), scrollable: false };
        assert_eq!(FrameGeometry.measure_sync(&handle), Some(frame));
        assert_eq!(NoGeometry.measure_sync(&handle), None);
    }

    #[test]
    fn test_default_async_path_is_unsupported() {
        let requests = PendingRequests::new(std::time::Duration::from_secs(1));
        let pending = requests.register();
        let completion = MeasureCompletion::new(pending.id, requests.clone());
        assert!(!NoGeometry.request_measure(&NativeHandle::default(), completion));
    }
}
