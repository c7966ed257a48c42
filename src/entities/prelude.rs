pub use super::messages::Entity as Messages;
pub use super::scores::Entity as Scores;
pub use super::tools::Entity as Tools;
pub use super::users::Entity as Users;
