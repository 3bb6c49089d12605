use clap::{Parser, Subcommand};
use simplelms::model::entity::{
    Category, CategoryCreate, Course, CourseCreate, MemberRole, UserEntity,
    UserEntityCreateUpdate,
};
use simplelms::model::{
    CrudRepository, DatabaseError, DbConnection, ModelManager, ResourceType, batch_enroll, enroll,
};
use simplelms::web::{AuthenticatedUser, UserRole};
use simplelms::{Config, error::AppResult};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(about = "CLI tool for administering the LMS database", long_about = None)]
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

    /// Manage categories
    Category {
        #[command(subcommand)]
        action: CategoryCommands,
    },

    /// Manage courses and their members
    Course {
        #[command(subcommand)]
        action: CourseCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    Add {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        /// Grant the admin role
        #[arg(long, default_value_t = false)]
        admin: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum CategoryCommands {
    Add {
        #[arg(long)]
        name: String,
        /// Username recorded as the creator
        #[arg(long)]
        created_by: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum CourseCommands {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value_t = 0)]
        price: i32,
        /// Username of the teacher
        #[arg(long)]
        teacher: String,
        /// Category name
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        max_students: Option<i32>,
    },
    /// Enroll one user
    Enroll {
        #[arg(long)]
        course: String,
        #[arg(long)]
        username: String,
        #[arg(long, default_value_t = false)]
        assistant: bool,
    },
    /// Enroll several users at once, nobody is enrolled if they don't all fit
    BatchEnroll {
        #[arg(long)]
        course: String,
        #[arg(long, num_args = 1.., required = true)]
        usernames: Vec<String>,
    },
}

async fn user_id(mm: &ModelManager, actor: &AuthenticatedUser, username: &str) -> AppResult<Uuid> {
    let user = UserEntity::find_by_username(mm, actor, username)
        .await?
        .ok_or(DatabaseError::NotFound(ResourceType::User))?;
    Ok(user.id())
}

async fn course_id(mm: &ModelManager, actor: &AuthenticatedUser, name: &str) -> AppResult<Uuid> {
    let course = Course::find_by_name(mm, actor, name)
        .await?
        .ok_or(DatabaseError::NotFound(ResourceType::Course))?;
    Ok(course.id())
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let _ = dotenvy::dotenv();
    let args = Cli::parse();

    let database_uri = match std::env::var("DATABASE_URL") {
        Ok(uri) => uri,
        Err(_) => Config::get_or_init(true).await.app().database_uri().to_owned(),
    };
    let mm = ModelManager::new(DbConnection::connect(&database_uri)?);
    let admin = AuthenticatedUser::admin();

    match args.command {
        Commands::User { action } => match action {
            UserCommands::Add { username, password, admin: is_admin } => {
                let mut user = UserEntity::create(
                    &mm,
                    &admin,
                    UserEntityCreateUpdate {
                        username,
                        password_hash: simplelms::auth::hash_password(&password)?,
                    },
                )
                .await?;
                if is_admin {
                    user = user.set_role(&mm, &admin, UserRole::Admin).await?;
                }
                println!("User created: {:?}", user);
            }
        },

        Commands::Category { action } => match action {
            CategoryCommands::Add { name, created_by } => {
                let creator = user_id(&mm, &admin, &created_by).await?;
                let actor = AuthenticatedUser::new(creator, UserRole::User);
                let data = CategoryCreate { name };
                data.validate().map_err(DatabaseError::Invalid)?;

                let category = Category::create(&mm, &actor, data).await?;
                println!("Category created: {:?}", category);
            }
        },

        Commands::Course { action } => match action {
            CourseCommands::Add {
                name,
                description,
                price,
                teacher,
                category,
                max_students,
            } => {
                let teacher_id = user_id(&mm, &admin, &teacher).await?;
                let category_id = match category {
                    Some(name) => Some(
                        Category::find_by_name(&mm, &admin, &name)
                            .await?
                            .ok_or(DatabaseError::NotFound(ResourceType::Category))?
                            .id(),
                    ),
                    None => None,
                };

                let data = CourseCreate {
                    name,
                    description,
                    price,
                    category_id,
                    max_students,
                    teacher_id: Some(teacher_id),
                };
                data.validate().map_err(DatabaseError::Invalid)?;

                let course = Course::create(&mm, &admin, data).await?;
                println!("Course created: {:?}", course);
            }

            CourseCommands::Enroll {
                course,
                username,
                assistant,
            } => {
                let course_id = course_id(&mm, &admin, &course).await?;
                let user_id = user_id(&mm, &admin, &username).await?;
                let role = if assistant {
                    MemberRole::Assistant
                } else {
                    MemberRole::Student
                };

                let member = enroll(&mm, course_id, user_id, role).await?;
                println!("Enrolled: {:?}", member);
            }

            CourseCommands::BatchEnroll { course, usernames } => {
                let course_id = course_id(&mm, &admin, &course).await?;
                let mut user_ids = Vec::with_capacity(usernames.len());
                for username in &usernames {
                    user_ids.push(user_id(&mm, &admin, username).await?);
                }

                let outcome = batch_enroll(&mm, course_id, &user_ids).await?;
                println!(
                    "Enrolled {} user(s), skipped {} already enrolled",
                    outcome.enrolled.len(),
                    outcome.skipped.len()
                );
            }
        },
    }

    Ok(())
}
