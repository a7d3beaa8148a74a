use stream::Notification;

/// Conversion-done interrupt handler.
///
/// The handler only posts `dataReady`. It never touches sample data or the
/// payload buffer and completes in constant time.
#[derive(Copy, Clone)]
pub struct InterruptHandler<'a> {
    data_ready: &'a Notification,
}

impl<'a> InterruptHandler<'a> {
    pub const fn new(data_ready: &'a Notification) -> Self {
        Self { data_ready }
    }

    /// Handle a DMA conversion-done event.
    ///
    /// # Returns
    /// Whether the processing task was released and a context switch should
    /// be requested on interrupt exit.
    #[inline]
    pub fn on_conversion_done(&self) -> bool {
        self.data_ready.notify()
    }
}
