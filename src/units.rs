use serde_derive::Deserialize;

#[derive(Eq, PartialEq, Copy, Clone, Debug, Deserialize)]
pub struct Width(pub usize);
#[derive(Eq, PartialEq, Copy, Clone, Debug, Deserialize)]
pub struct Height(pub usize);

#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub struct RowIndex(pub usize);

#[derive(Eq, PartialEq, Copy, Clone, Debug, PartialOrd, Ord)]
pub struct StepsCount(pub usize);
