use crate::event::MaterialEvent;

/// Boxed error a handler reports to the dispatching side.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Consumes material events of the types it declares.
///
/// Handlers are looked up by event type (see
/// [`MaterialEventHandlerRegistry`](crate::MaterialEventHandlerRegistry)), so
/// `handled_event_types()` must list every type `handle_event()` acts on.
/// Events of other types may still be passed in and are expected to be
/// ignored.
///
/// Handlers keep their collaborators behind `&self`; a handler instance is
/// shared by the dispatching thread for its whole lifetime.
pub trait MaterialEventHandler: Send + Sync {
    /// Name used in logs and dispatch errors.
    fn name(&self) -> &'static str {
        core::any::type_name::<Self>()
    }

    fn handled_event_types(&self) -> &'static [&'static str];

    fn handle_event(&self, event: &MaterialEvent) -> Result<(), BoxError>;
}
