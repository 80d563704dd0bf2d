mod category_repository;
mod comment_repository;
mod company_repository;
mod investment_repository;
mod like_repository;
mod message_repository;
mod post_repository;

pub use category_repository::CategoryRepository;
pub use comment_repository::CommentRepository;
pub use company_repository::CompanyRepository;
pub use investment_repository::InvestmentRepository;
pub use like_repository::LikeRepository;
pub use message_repository::MessageRepository;
pub use post_repository::PostRepository;
