use posture_source::{ControlsInputsGetter, ExceptionsGetter};
use posture_types::{ControlsInputs, Exception};

/// Whatever overlays could be fetched. Either field may be missing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Overlays {
    pub exceptions: Option<Vec<Exception>>,
    pub controls_inputs: Option<ControlsInputs>,
}

/// Fetch exceptions and controls-inputs for `scope`.
///
/// The two fetches are independent and best effort: a failure leaves that field `None` and is
/// only visible at debug level.
pub fn load_overlays<E, C>(exceptions: &E, controls_inputs: &C, scope: &str) -> Overlays
where
    E: ExceptionsGetter + ?Sized,
    C: ControlsInputsGetter + ?Sized,
{
    let exceptions = match exceptions.get_exceptions(scope) {
        Ok(list) => Some(list),
        Err(err) => {
            tracing::debug!(scope, error = %err, "exceptions not loaded");
            None
        }
    };

    let controls_inputs = match controls_inputs.get_controls_inputs(scope) {
        Ok(inputs) => Some(inputs),
        Err(err) => {
            tracing::debug!(scope, error = %err, "controls-inputs not loaded");
            None
        }
    };

    Overlays {
        exceptions,
        controls_inputs,
    }
}
