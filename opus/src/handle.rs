//! Owned native codec state with single, race-free release.

use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::error::OpusError;
use crate::ffi;

/// A native object that can be destroyed exactly once.
///
/// # Safety
///
/// `destroy` must accept any pointer produced by the matching native create
/// call and must not fail.
pub unsafe trait NativeResource {
    /// Short name used in logs.
    const KIND: &'static str;

    /// Frees the native object.
    ///
    /// # Safety
    ///
    /// `ptr` must be live and must not be used afterwards.
    unsafe fn destroy(ptr: NonNull<Self>);
}

unsafe impl NativeResource for ffi::OpusEncoder {
    const KIND: &'static str = "encoder";

    unsafe fn destroy(ptr: NonNull<Self>) {
        unsafe { ffi::opus_encoder_destroy(ptr.as_ptr()) };
    }
}

unsafe impl NativeResource for ffi::OpusDecoder {
    const KIND: &'static str = "decoder";

    unsafe fn destroy(ptr: NonNull<Self>) {
        unsafe { ffi::opus_decoder_destroy(ptr.as_ptr()) };
    }
}

/// Exclusively owned handle to native codec state.
///
/// The pointer lives behind a lock. [`with`](Self::with) holds the lock for
/// the duration of a native call and [`release`](Self::release) takes the
/// same lock, so a release can never interleave with an in-flight call.
/// Once released the handle stays released.
pub struct NativeHandle<T: NativeResource> {
    ptr: Mutex<Option<NonNull<T>>>,
    valid: AtomicBool,
}

// Safety: the pointer is only reached through the mutex, and libopus state
// is not bound to the thread that created it.
unsafe impl<T: NativeResource> Send for NativeHandle<T> {}
unsafe impl<T: NativeResource> Sync for NativeHandle<T> {}

impl<T: NativeResource> NativeHandle<T> {
    /// Runs `factory` and takes ownership of the pointer it returns.
    ///
    /// A null pointer from a factory that reported success is treated as an
    /// allocation failure.
    pub fn create<F>(factory: F) -> Result<Self, OpusError>
    where
        F: FnOnce() -> Result<*mut T, OpusError>,
    {
        let raw = factory()?;
        let ptr = NonNull::new(raw).ok_or_else(|| OpusError::native(ffi::OPUS_ALLOC_FAIL))?;
        tracing::debug!(kind = T::KIND, "opus: native handle created");
        Ok(Self {
            ptr: Mutex::new(Some(ptr)),
            valid: AtomicBool::new(true),
        })
    }

    /// Returns true until the handle has been released.
    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    /// Fails with `UseAfterRelease` once the handle has been released.
    ///
    /// Lets callers reject a dead handle before validating arguments. The
    /// answer can go stale immediately; [`with`](Self::with) re-checks under
    /// the lock.
    pub fn ensure_valid(&self) -> Result<(), OpusError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(OpusError::UseAfterRelease)
        }
    }

    /// Runs `f` with the live pointer, or fails with `UseAfterRelease`.
    pub fn with<R, F>(&self, f: F) -> Result<R, OpusError>
    where
        F: FnOnce(NonNull<T>) -> Result<R, OpusError>,
    {
        let guard = self.ptr.lock();
        match *guard {
            Some(ptr) => f(ptr),
            None => Err(OpusError::UseAfterRelease),
        }
    }

    /// Destroys the native state. Returns true if this call performed the
    /// release; later and concurrent calls are no-ops returning false.
    pub fn release(&self) -> bool {
        let mut guard = self.ptr.lock();
        let Some(ptr) = guard.take() else {
            return false;
        };
        self.valid.store(false, Ordering::Release);
        unsafe { T::destroy(ptr) };
        tracing::debug!(kind = T::KIND, "opus: native handle released");
        true
    }
}

impl<T: NativeResource> Drop for NativeHandle<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T: NativeResource> std::fmt::Debug for NativeHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeHandle")
            .field("kind", &T::KIND)
            .field("valid", &self.is_valid())
            .finish()
    }
}
