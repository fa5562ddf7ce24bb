//! Common imports for writing scenarios and test cases. `use testurio::prelude::*;`
//! pulls in the component variants, step/testcase/scenario builders, and
//! the phase and hook types their builder APIs return.

pub use crate::component::{
    AsyncClient, AsyncClientEventBuilder, AsyncClientStepBuilder, AsyncServer,
    AsyncServerStepBuilder, Component, ComponentError, ComponentFactory, ComponentScope,
    ComponentState, DataSource, DataSourceExecBuilder, DataSourceStepBuilder, EventWaitBuilder,
    HasStepBuilder, MockEventBuilder, MockRequestBuilder, Proxy, ProxyHookBuilder,
    ProxyStepBuilder, Publisher, PublisherStepBuilder, RequestBuilder, StartTier, Subscriber,
    SubscriberStepBuilder, SyncClient, SyncClientStepBuilder, SyncServer, SyncServerStepBuilder,
};
pub use crate::error::{Result, TesturioError};
pub use crate::hook::{Handler, HandlerError, HandlerOutput, Hook, Matcher, PayloadMatcher};
pub use crate::message::{Interaction, InteractionDirection, Message};
pub use crate::phase::Phase;
pub use crate::reporter::{InMemoryReporter, NoopReporter, Reporter};
pub use crate::scenario::{Summary, TestResult, TestScenario, TestScenarioConfig};
pub use crate::step::{Step, StepAction, StepOutcome, StepResult};
pub use crate::testcase::{TestCase, TestCaseBuilder, TestCaseMetadata, TestCaseResult};
pub use crate::util::Address;
