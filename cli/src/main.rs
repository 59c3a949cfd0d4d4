use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use onlinecourse::Config;
use onlinecourse::model::{CrudRepository, DatabaseError, DbConnection, ModelManager};
use onlinecourse::model::entity::{
    ChoiceCreate,
    Choice,
    Course,
    CourseCreate,
    Lesson,
    LessonCreate,
    Question,
    QuestionCreate,
    UserEntity,
    UserEntityCreateUpdate,
};
use onlinecourse::web::{AuthenticatedUser, UserRole};

#[derive(Parser, Debug)]
#[command(about = "CLI tool for filling the course DB", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
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

    /// Manage lessons
    Lesson {
        #[command(subcommand)]
        action: LessonCommands,
    },

    /// Manage exam questions
    Question {
        #[command(subcommand)]
        action: QuestionCommands,
    },
}

/// User management
#[derive(Subcommand, Debug)]
pub enum UserCommands {
    Add {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
        /// `admin` or `user`
        #[arg(long, default_value = "user")]
        role: String,
    },
}

/// Course management
#[derive(Subcommand, Debug)]
pub enum CourseCommands {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
        /// Image path relative to `uploads/`
        #[arg(long, default_value = "")]
        image: String,
        /// Publication date, YYYY-MM-DD
        #[arg(long)]
        pub_date: Option<NaiveDate>,
    },
}

/// Lesson management
#[derive(Subcommand, Debug)]
pub enum LessonCommands {
    Add {
        /// Course name to attach the lesson to
        #[arg(long)]
        course_name: String,
        #[arg(long)]
        title: String,
        /// Path to a Markdown file with lesson content
        #[arg(long)]
        file: String,
        #[arg(long, default_value_t = 0)]
        order_index: i32,
    },
}

/// Question management
#[derive(Subcommand, Debug)]
pub enum QuestionCommands {
    Add {
        /// Course name to attach the question to
        #[arg(long)]
        course_name: String,
        #[arg(long)]
        text: String,
        #[arg(long, default_value_t = 1)]
        grade_point: i32,
    },
    AddChoice {
        /// Question text to attach the choice to
        #[arg(long)]
        question_text: String,
        #[arg(long)]
        text: String,
        #[arg(long, default_value_t = false)]
        is_correct: bool,
    },
}

#[tokio::main]
async fn main() -> onlinecourse::error::AppResult<()> {
    let _ = dotenvy::dotenv();
    let args = Cli::parse();

    let database_uri = match std::env::var("DATABASE_URL") {
        Ok(uri) => uri,
        Err(_) => Config::get_or_init(true).await.app().database_uri().to_string(),
    };
    let db_con = DbConnection::connect(&database_uri)?;
    db_con.migrate().await?;
    let mm = ModelManager::new(db_con);
    let actor = AuthenticatedUser::admin();

    match args.command {
        Commands::User { action } => match action {
            UserCommands::Add { username, password, first_name, last_name, role } => {
                let user = UserEntity::create_with_role(
                    &mm,
                    &actor,
                    UserEntityCreateUpdate {
                        username,
                        password_hash: onlinecourse::auth::hash_password(&password)?,
                        first_name,
                        last_name,
                    },
                    UserRole::from(role.as_str()),
                )
                .await?;
                println!("User created: {:?}", user);
            }
        },

        Commands::Course { action } => match action {
            CourseCommands::Add { name, description, image, pub_date } => {
                let course = Course::create(
                    &mm,
                    &actor,
                    CourseCreate {
                        name,
                        image,
                        description,
                        pub_date,
                    },
                )
                .await?;
                println!("Course created: {:?}", course);
            }
        },

        Commands::Lesson { action } => match action {
            LessonCommands::Add { course_name, title, file, order_index } => {
                let course = Course::find_by_name(&mm, &actor, &course_name)
                    .await?
                    .ok_or(DatabaseError::SqlxError(sqlx::Error::RowNotFound))?;

                let content = std::fs::read_to_string(file)?;
                let lesson = Lesson::create(
                    &mm,
                    &actor,
                    LessonCreate {
                        course_id: course.id(),
                        title,
                        content,
                        order_index: Some(order_index),
                    },
                )
                .await?;
                println!("Lesson created: {:?}", lesson);
            }
        },

        Commands::Question { action } => match action {
            QuestionCommands::Add { course_name, text, grade_point } => {
                let course = Course::find_by_name(&mm, &actor, &course_name)
                    .await?
                    .ok_or(DatabaseError::SqlxError(sqlx::Error::RowNotFound))?;

                let question = Question::create(
                    &mm,
                    &actor,
                    QuestionCreate {
                        course_id: course.id(),
                        question_text: text,
                        grade_point: Some(grade_point),
                    },
                )
                .await?;
                println!("Question created: {:?}", question);
            }

            QuestionCommands::AddChoice { question_text, text, is_correct } => {
                let question = Question::find_by_text(&mm, &actor, &question_text)
                    .await?
                    .ok_or(DatabaseError::SqlxError(sqlx::Error::RowNotFound))?;

                let choice = Choice::create(
                    &mm,
                    &actor,
                    ChoiceCreate {
                        question_id: question.id(),
                        choice_text: text,
                        is_correct: Some(is_correct),
                    },
                )
                .await?;
                println!("Choice created: {:?}", choice);
            }
        },
    }

    Ok(())
}
