use crate::{
    error::{Error, HtmlError},
    jwt::SessionData,
    schema::{Recipe, UserId},
};

const ACTION_TABLE: &[(Audience, &[ActionType])] = &[
    (Audience::Anonymous, &[ActionType::ViewPublicRecipes]),
    (
        Audience::Authenticated,
        &[
            ActionType::ViewPublicRecipes,
            ActionType::ViewOwnRecipes,
            ActionType::CreateRecipes,
            ActionType::CreateIngredients,
            ActionType::UploadImages,
            ActionType::ManageOwnRecipes,
        ],
    ),
];

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Audience {
    Anonymous,
    Authenticated,
}

impl Audience {
    pub fn of(session: Option<&SessionData>) -> Self {
        match session {
            Some(_) => Audience::Authenticated,
            None => Audience::Anonymous,
        }
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ActionType {
    ViewPublicRecipes,
    ViewOwnRecipes,

    CreateRecipes,
    CreateIngredients,
    UploadImages,

    ManageOwnRecipes,
}

impl ActionType {
    pub fn authenticate(self, session: Option<&SessionData>) -> bool {
        let audience = Audience::of(session);

        ACTION_TABLE
            .iter()
            .find(|(a, _)| *a == audience)
            .map(|(_, actions)| actions.contains(&self))
            .unwrap_or(false)
    }
}

/// The session, if it is allowed to perform `action`.
pub fn authorize(session: Option<&SessionData>, action: ActionType) -> Result<&SessionData, Error> {
    if !action.authenticate(session) {
        return Err(match session {
            None => {
                HtmlError::InvalidSession.new("You need to be signed in to perform this action")
            }
            Some(_) => HtmlError::Unauthorized.default(),
        });
    }

    session.ok_or_else(|| HtmlError::InvalidSession.default())
}

pub fn viewer_id(session: Option<&SessionData>) -> Option<&UserId> {
    session.map(|session| &session.user_id)
}

pub fn can_manage(recipe: &Recipe, session: &SessionData) -> bool {
    ActionType::ManageOwnRecipes.authenticate(Some(session)) && recipe.is_owned_by(&session.user_id)
}
