use clap::{Parser, Subcommand};
use studyhub::model::entity::{
    AnswerOptionInput, Course, CourseCreate, GeneratedQuestion, Question, QuestionCreate,
    QuestionType, TestCreate, TestEntity, UserEntity,
};
use studyhub::model::{CrudRepository, DatabaseError, DbConnection, ModelManager};
use studyhub::web::dto::account::RegisterBody;
use studyhub::web::{AuthenticatedUser, UserRole};
use studyhub::{Config, error::AppResult};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(about = "CLI tool for seeding the StudyHub database", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply pending migrations
    Migrate,

    /// Manage users
    User {
        #[command(subcommand)]
        action: UserCommands,
    },

    /// Manage courses
    Course {
        #[command(subcommand)]
        action: CourseCommands,
    },

    /// Manage tests and their questions
    Test {
        #[command(subcommand)]
        action: TestCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    Add {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        phone: String,
        /// student, teacher or admin
        #[arg(long, default_value = "student")]
        role: String,
    },
    /// Change the role of an existing account
    Promote {
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "admin")]
        role: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum CourseCommands {
    Add {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "english")]
        category: String,
        #[arg(long)]
        level: Option<String>,
        #[arg(long, default_value_t = 0)]
        cost: i64,
        /// Email of the teacher owning the course
        #[arg(long)]
        teacher_email: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum TestCommands {
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        skill: String,
        #[arg(long)]
        level: String,
        #[arg(long, default_value_t = 30)]
        duration_min: i32,
        #[arg(long, default_value_t = 5.0)]
        passing_score: f64,
        #[arg(long)]
        max_attempts: Option<i32>,
        /// Course title; required for a final test
        #[arg(long)]
        course_title: Option<String>,
        #[arg(long, default_value_t = false)]
        is_final: bool,
    },
    /// Add a multiple-choice question; the correct option is given by letter
    AddQuestion {
        #[arg(long)]
        test_title: String,
        #[arg(long)]
        text: String,
        #[arg(long = "option", required = true)]
        options: Vec<String>,
        #[arg(long)]
        correct: char,
        #[arg(long, default_value_t = 1.0)]
        points: f64,
        #[arg(long)]
        skill: Option<String>,
        #[arg(long)]
        topic: Vec<String>,
        #[arg(long)]
        explanation: Option<String>,
    },
    /// Import a JSON array of generated questions (`question_text`, `options`, `answer`, ...)
    Import {
        #[arg(long)]
        test_title: String,
        #[arg(long)]
        file: String,
    },
}

async fn id_by_title(mm: &ModelManager, table: &str, title: &str) -> AppResult<Uuid> {
    let id = sqlx::query_scalar(&format!("SELECT id FROM {table} WHERE title = $1"))
        .bind(title)
        .fetch_one(mm.executor())
        .await
        .map_err(DatabaseError::SqlxError)?;
    Ok(id)
}

async fn user_by_email(mm: &ModelManager, actor: &AuthenticatedUser, email: &str) -> AppResult<UserEntity> {
    UserEntity::find_by_email(mm, actor, email)
        .await?
        .ok_or_else(|| DatabaseError::SqlxError(sqlx::Error::RowNotFound).into())
}

fn invalid_input(message: impl std::fmt::Display) -> ! {
    eprintln!("invalid input: {message}");
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let _ = dotenvy::dotenv();
    let args = Cli::parse();

    let database_uri = match std::env::var("DATABASE_URL") {
        Ok(uri) => uri,
        Err(_) => Config::get_or_init(true).await.app().database_uri().to_string(),
    };
    let db_con = DbConnection::connect(&database_uri)?;

    if let Commands::Migrate = args.command {
        db_con.migrate().await?;
        println!("Migrations applied");
        return Ok(());
    }

    let mm = ModelManager::new(db_con);
    let actor = AuthenticatedUser::admin();

    match args.command {
        Commands::Migrate => {}

        Commands::User { action } => match action {
            UserCommands::Add { email, password, full_name, phone, role } => {
                let body = RegisterBody {
                    email,
                    password,
                    full_name,
                    phone,
                    wallet_address: None,
                    date_of_birth: None,
                    gender: None,
                    learning_goals: None,
                };
                if let Err(e) = body.validate() {
                    invalid_input(e);
                }

                let hash = studyhub::auth::hash_password(&body.password)?;
                let mut user = UserEntity::create(&mm, &actor, body.into_entity(hash)).await?;
                let role = UserRole::from(role.as_str());
                if role != UserRole::Student {
                    user.set_role(&mm, &actor, role).await?;
                }
                println!("User created: {} ({})", user.email(), user.role());
            }
            UserCommands::Promote { email, role } => {
                let mut user = user_by_email(&mm, &actor, &email).await?;
                user.set_role(&mm, &actor, UserRole::from(role.as_str())).await?;
                println!("User {} is now {}", user.email(), user.role());
            }
        },

        Commands::Course { action } => match action {
            CourseCommands::Add { title, description, category, level, cost, teacher_email } => {
                let teacher_id = match teacher_email {
                    Some(email) => Some(user_by_email(&mm, &actor, &email).await?.id()),
                    None => None,
                };
                let course = Course::create(
                    &mm,
                    &actor,
                    CourseCreate {
                        title,
                        description,
                        category,
                        level,
                        cost,
                        teacher_id,
                    },
                )
                .await?;
                println!("Course created: {} ({})", course.title(), course.id());
            }
        },

        Commands::Test { action } => match action {
            TestCommands::Add {
                title,
                skill,
                level,
                duration_min,
                passing_score,
                max_attempts,
                course_title,
                is_final,
            } => {
                let course_id = match course_title {
                    Some(course) => Some(id_by_title(&mm, "courses", &course).await?),
                    None if is_final => invalid_input("a final test needs --course-title"),
                    None => None,
                };
                let test = TestEntity::create(
                    &mm,
                    &actor,
                    TestCreate {
                        title,
                        description: String::new(),
                        skill: skill.to_lowercase(),
                        level,
                        duration_min,
                        passing_score,
                        max_attempts,
                        is_final,
                        course_id,
                        created_by: None,
                    },
                )
                .await?;
                println!("Test created: {} ({})", test.title(), test.id());
            }

            TestCommands::AddQuestion {
                test_title,
                text,
                options,
                correct,
                points,
                skill,
                topic,
                explanation,
            } => {
                let test_id = id_by_title(&mm, "tests", &test_title).await?;
                let correct_index = (correct.to_ascii_uppercase() as usize)
                    .checked_sub('A' as usize)
                    .filter(|i| *i < options.len())
                    .unwrap_or_else(|| invalid_input("--correct must name one of the options"));

                let options = options
                    .into_iter()
                    .enumerate()
                    .map(|(i, option_text)| AnswerOptionInput {
                        option_text,
                        is_correct: i == correct_index,
                    })
                    .collect();

                let question = Question::create(
                    &mm,
                    &actor,
                    QuestionCreate {
                        test_id,
                        question_text: text,
                        question_type: QuestionType::Mcq,
                        points: Some(points),
                        skill,
                        topic,
                        explanation,
                        audio_url: None,
                        image_url: None,
                        order_index: None,
                        options: Some(options),
                    },
                )
                .await?;
                println!("Question created: {}", question.id());
            }

            TestCommands::Import { test_title, file } => {
                let test_id = id_by_title(&mm, "tests", &test_title).await?;
                let raw = std::fs::read_to_string(file)?;
                let items: Vec<GeneratedQuestion> =
                    serde_json::from_str(&raw).unwrap_or_else(|e| invalid_input(e));

                let created = Question::bulk_create(&mm, &actor, test_id, items).await?;
                println!("Imported {} questions", created.len());
            }
        },
    }

    Ok(())
}
