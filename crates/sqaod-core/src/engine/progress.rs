/// Events emitted while an annealing schedule runs.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    /// Replicas are allocated and every lifecycle slot is filled.
    Initialized {
        n0: usize,
        n1: usize,
        num_trotters: usize,
    },

    TaskStart { total_steps: u64 },
    TaskIncrement,
    TaskFinish,

    /// One annealing step finished at transverse field `g`.
    Step { index: u64, g: f64 },
}

/// Receiver for [`Progress`] events; borrowed state is allowed through `'a`.
pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

/// Forwards events to an optional callback. Without one, reporting is a no-op.
#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(callback) = self.callback.as_ref() {
            callback(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn reporter_without_callback_is_silent() {
        ProgressReporter::new().report(Progress::TaskIncrement);
    }

    #[test]
    fn reporter_forwards_events_in_order() {
        let seen = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            seen.lock().unwrap().push(event);
        }));
        reporter.report(Progress::Initialized {
            n0: 3,
            n1: 2,
            num_trotters: 4,
        });
        reporter.report(Progress::Step { index: 0, g: 0.5 });
        reporter.report(Progress::TaskFinish);
        drop(reporter);
        assert_eq!(
            seen.into_inner().unwrap(),
            vec![
                Progress::Initialized {
                    n0: 3,
                    n1: 2,
                    num_trotters: 4,
                },
                Progress::Step { index: 0, g: 0.5 },
                Progress::TaskFinish,
            ]
        );
    }
}
