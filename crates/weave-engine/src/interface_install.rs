//! Interface installation (§4.2.1): the first, simplest step of rewriting —
//! add the handler type to the handlee's implemented-interface list.

use weave_core::ClassTree;
use weave_spec::HandlerSpec;

pub fn install(handlee: &mut ClassTree, spec: &HandlerSpec) {
    handlee.add_interface_if_absent(&spec.handler_type);
}

#[cfg(test)]
mod tests {
    use super::*;
    use weave_core::AccessFlags;

    fn spec() -> HandlerSpec {
        weave_spec::analyze(
            &{
                let mut iface = ClassTree::new("pkg/Counter", 52, AccessFlags::PUBLIC | AccessFlags::INTERFACE);
                iface
            },
            None,
            None,
        )
        .unwrap()
    }

    #[test]
    fn adds_handler_interface_once() {
        let mut handlee = ClassTree::new("pkg/Handlee", 52, AccessFlags::PUBLIC);
        let spec = spec();
        install(&mut handlee, &spec);
        install(&mut handlee, &spec);
        assert_eq!(handlee.interfaces, vec!["pkg/Counter".to_string()]);
    }
}
