mod user;
pub use user::{UserEntity, UserEntityCreateUpdate};

mod category;
pub use category::{CATEGORY_NAME_MAX_LEN, Category, CategoryCreate};

mod course;
pub use course::{Course, CourseCreate, CourseFilter, DEFAULT_MAX_STUDENTS};

mod course_member;
pub use course_member::{CourseMember, CourseMemberCreate, MemberRole};

mod course_content;
pub use course_content::{CourseContent, CourseContentCreate};

mod comment;
pub use comment::{Comment, CommentCreate, CommentRow};

mod content_completion;
pub use content_completion::{ContentCompletion, ContentCompletionCreate};

mod announcement;
pub use announcement::{Announcement, AnnouncementCreate, AnnouncementFilter};
