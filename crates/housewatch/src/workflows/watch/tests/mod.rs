mod common;
mod criteria;
mod routing;
