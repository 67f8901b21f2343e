mod user;
pub use user::{UserEntity, UserEntityCreateUpdate};

mod session;
pub use session::{Session, SessionCreate};

mod course;
pub use course::{Course, CourseCreate, CourseOverview};

mod course_rating;
pub use course_rating::{CourseRating, CourseRatingCreate};

mod grammar_lesson;
pub use grammar_lesson::{GrammarLesson, GrammarLessonCreate};

mod test;
pub use test::{DEFAULT_MAX_ATTEMPTS, TestCreate, TestEntity};

mod question;
pub use question::{
    AnswerOptionInput, GeneratedQuestion, Question, QuestionCreate, QuestionType,
    QuestionWithOptions, points_per_question,
};

mod answer_option;
pub use answer_option::{AnswerOption, AnswerOptionCreate};

mod test_pool;
pub use test_pool::{POOL_ACTIVE, POOL_ARCHIVED, TestPool, TestPoolCreate};

mod test_attempt;
pub use test_attempt::{
    AttemptHistoryRow, AttemptSubmission, DEFAULT_EVALUATION_MODEL, TestAttempt,
    TestAttemptCreate,
};

mod attempt_detail;
pub use attempt_detail::{AttemptDetail, AttemptDetailCreate};

mod certificate;
pub use certificate::{Certificate, CertificateCreate};

mod payment;
pub use payment::{CourseRevenue, Payment, PaymentCreate, PaymentStatus, PaymentTotals};

mod study_log;
pub use study_log::{StudyLog, StudyLogCreate};
