mod coordinator;
mod frontend;
mod progress;
mod quiz;
mod sequence;

pub use coordinator::SceneCoordinator;
pub use frontend::{
    AudioSurface, EffectsSurface, Frontend, NarrationLine, NarrationPresenter, Persona,
    ProgressSink, StageView,
};
pub use progress::ProgressStore;
pub use quiz::{
    accuracy, MissionReport, OptionView, QuestionPrompt, QuizError, QuizSession, QuizSignal,
    QuizStep, ReportStatus,
};
pub use sequence::{EventSequencer, SequenceOutcome, SequencePhase, SequenceTick, StageEffect};
